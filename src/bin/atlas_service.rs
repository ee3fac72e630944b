//! C13 serving surface: the `/lookup`, `/health`, `/metrics` HTTP service
//! (§6). Loads the latest published snapshot from `SNAPSHOTS_DIR`, opens
//! the configured boundary source, and serves requests until terminated.

use std::sync::Arc;

use shadow_atlas::hash::verify_pinned_constant_table;
use shadow_atlas::service::{create_router, RuntimeConfig, ServiceState};
use shadow_atlas::source::SqliteSource;
use shadow_atlas::AtlasSnapshot;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    // §4.1/§7: fatal at startup, no graceful fallback for a constant-table
    // mismatch. See `atlas_builder`'s main for the same check.
    if verify_pinned_constant_table().is_err() {
        tracing::error!("CRYPTOGRAPHIC_INTEGRITY_FAILURE: constant table digest mismatch");
        std::process::exit(1);
    }

    let config = RuntimeConfig::from_env();

    let snapshot = AtlasSnapshot::load_latest_from_dir(std::path::Path::new(&config.snapshots_dir))
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to read snapshots directory");
            std::process::exit(1);
        })
        .unwrap_or_else(|| {
            tracing::error!(dir = %config.snapshots_dir, "no published atlas snapshot found");
            std::process::exit(1);
        });

    if let Err(e) = snapshot.verify_integrity() {
        tracing::error!(error = %e, "SNAPSHOT_INTEGRITY_FAILURE: refusing to serve an unverifiable snapshot");
        std::process::exit(1);
    }

    let source = SqliteSource::open(&config.db_path).unwrap_or_else(|e| {
        tracing::error!(error = %e, db_path = %config.db_path, "failed to open boundary source");
        std::process::exit(1);
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, addr = %bind_addr, "failed to bind");
        std::process::exit(1);
    });

    tracing::info!(
        addr = %bind_addr,
        snapshot_version = snapshot.version,
        leaf_count = snapshot.leaf_count,
        "shadow-atlas service starting"
    );

    let state = Arc::new(ServiceState::new(
        Arc::new(source),
        snapshot,
        config,
        chrono::Utc::now(),
    ));
    let app = create_router(state);

    axum::serve(listener, app).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "server exited with error");
        std::process::exit(1);
    });
}

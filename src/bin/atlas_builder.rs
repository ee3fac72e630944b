//! C12 CLI: build an [`AtlasSnapshot`] from already-validated boundaries and
//! publish it to `SNAPSHOTS_DIR` (§4.12, §6).
//!
//! Usage:
//!
//! ```text
//! atlas_builder --manifest boundaries.json --version 42 [--registry registry.json] [--out ./snapshots]
//! ```
//!
//! `--manifest` is a JSON array of `{state, layer, boundaries}` entries,
//! each `boundaries` entry a serialized [`shadow_atlas::types::Boundary`] —
//! the output of a C7 extraction run that has already passed C6 validation.
//! `--registry` is an optional JSON map of `"state/layer": expected_count`
//! used for the manifest's registry-count check (§4.6). This binary does
//! not itself extract or validate; it is the last, single-threaded step of
//! the pipeline, matching §5's "the atlas builder is single-threaded by
//! design: determinism trumps throughput."

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;
use shadow_atlas::hash::verify_pinned_constant_table;
use shadow_atlas::snapshot::build_snapshot;
use shadow_atlas::types::Boundary;
use shadow_atlas::validation::ExpectedCountRegistry;
use shadow_atlas::AtlasSnapshot;

#[derive(Deserialize)]
struct ManifestEntry {
    state: String,
    layer: String,
    boundaries: Vec<Boundary>,
}

struct Args {
    manifest: PathBuf,
    registry: Option<PathBuf>,
    out_dir: PathBuf,
    version: u64,
}

fn parse_args() -> Args {
    let mut manifest = None;
    let mut registry = None;
    let mut out_dir = PathBuf::from(std::env::var("SNAPSHOTS_DIR").unwrap_or_else(|_| "./snapshots".to_string()));
    let mut version = None;

    let mut raw = std::env::args().skip(1);
    while let Some(flag) = raw.next() {
        match flag.as_str() {
            "--manifest" => manifest = raw.next().map(PathBuf::from),
            "--registry" => registry = raw.next().map(PathBuf::from),
            "--out" => out_dir = raw.next().map(PathBuf::from).unwrap_or(out_dir),
            "--version" => version = raw.next().and_then(|v| v.parse().ok()),
            other => {
                eprintln!("atlas_builder: unrecognized flag {other}");
                std::process::exit(2);
            }
        }
    }

    let manifest = manifest.unwrap_or_else(|| {
        eprintln!("atlas_builder: --manifest <path> is required");
        std::process::exit(2);
    });
    let version = version.unwrap_or_else(|| {
        eprintln!("atlas_builder: --version <epoch> is required");
        std::process::exit(2);
    });

    Args { manifest, registry, out_dir, version }
}

fn load_registry(path: &Option<PathBuf>) -> ExpectedCountRegistry {
    let Some(path) = path else { return ExpectedCountRegistry::new() };
    let body = std::fs::read_to_string(path).expect("registry file must be readable");
    let raw: BTreeMap<String, u64> = serde_json::from_str(&body).expect("registry file must be valid JSON");
    raw.into_iter()
        .filter_map(|(key, count)| {
            let (state, layer) = key.split_once('/')?;
            Some(((state.to_string(), layer.to_string()), count))
        })
        .collect()
}

fn main() {
    tracing_subscriber::fmt::init();

    // §4.1/§7: a constant-table digest mismatch is the one startup-fatal
    // path in this crate. This checks the live params against a digest
    // pinned independently of them, so an accidental edit to the param
    // table is actually caught rather than trivially agreeing with itself.
    if verify_pinned_constant_table().is_err() {
        eprintln!("atlas_builder: FATAL cryptographic integrity failure — constant table digest mismatch");
        std::process::exit(1);
    }

    let args = parse_args();
    let registry = load_registry(&args.registry);

    let manifest_body = std::fs::read_to_string(&args.manifest).unwrap_or_else(|e| {
        eprintln!("atlas_builder: failed to read {}: {e}", args.manifest.display());
        std::process::exit(1);
    });
    let entries: Vec<ManifestEntry> = serde_json::from_str(&manifest_body).unwrap_or_else(|e| {
        eprintln!("atlas_builder: failed to parse manifest: {e}");
        std::process::exit(1);
    });

    let mut boundaries_by_state_layer: BTreeMap<(String, String), Vec<Boundary>> = BTreeMap::new();
    let mut total = 0usize;
    for entry in entries {
        total += entry.boundaries.len();
        boundaries_by_state_layer
            .entry((entry.state, entry.layer))
            .or_default()
            .extend(entry.boundaries);
    }

    tracing::info!(total_boundaries = total, version = args.version, "building atlas snapshot");

    let built_at = chrono::Utc::now();
    let snapshot = build_snapshot(&boundaries_by_state_layer, args.version, &registry, vec![], built_at)
        .unwrap_or_else(|e| {
            eprintln!("atlas_builder: FATAL build failure: {e}");
            std::process::exit(1);
        });

    // Determinism invariant (§4.12): two builds from the same inputs must
    // be byte-identical. Verify it against this very build before publishing.
    let rebuilt = build_snapshot(&boundaries_by_state_layer, args.version, &registry, vec![], built_at)
        .expect("a second build from the same inputs must also succeed");
    assert_eq!(snapshot.root, rebuilt.root, "atlas builder is non-deterministic");

    snapshot.save_to_dir(&args.out_dir).unwrap_or_else(|e| {
        eprintln!("atlas_builder: failed to write snapshot: {e}");
        std::process::exit(1);
    });

    println!(
        "wrote {} (leaves={}, root=0x{})",
        AtlasSnapshot::filename_for_version(args.version),
        snapshot.leaf_count,
        hex::encode(snapshot.root),
    );
}

//! Service configuration and shared state.
//!
//! Holds the boundary source, the currently published snapshot, the
//! resolution cache, and the counters `/metrics` serializes (§6).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};

use crate::resolver::ResolutionCache;
use crate::snapshot::AtlasSnapshot;
use crate::source::BoundarySource;

/// Runtime configuration, populated from the environment variables named
/// in §6: `DB_PATH`, `SNAPSHOTS_DIR`, `IPFS_GATEWAY`, `CACHE_SIZE`,
/// `CACHE_TTL_SECONDS`, `RATE_LIMIT_PER_MINUTE`, `SYNC_INTERVAL_SECONDS`.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// SQLite boundary store path (C4).
    pub db_path: String,
    /// Directory published Atlas snapshots (C12) are read from.
    pub snapshots_dir: String,
    /// Content-addressed storage gateway snapshots are fetched through.
    pub ipfs_gateway: String,
    /// Resolution cache capacity (entries).
    pub cache_size: usize,
    /// Resolution cache TTL, seconds.
    pub cache_ttl_seconds: u64,
    /// Upstream-facing rate limit, requests per minute.
    pub rate_limit_per_minute: u32,
    /// How often the service polls for a newer published snapshot.
    pub sync_interval_seconds: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            db_path: "./shadow-atlas.db".to_string(),
            snapshots_dir: "./snapshots".to_string(),
            ipfs_gateway: "https://ipfs.io/ipfs".to_string(),
            cache_size: 10_000,
            cache_ttl_seconds: 86_400,
            rate_limit_per_minute: 600,
            sync_interval_seconds: 300,
        }
    }
}

impl RuntimeConfig {
    /// Read overrides from the environment, falling back to [`Default`]
    /// for anything unset or unparsable. No config crate: plain
    /// `std::env::var` parsing, same economy as the rest of this crate's
    /// constructors.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            db_path: std::env::var("DB_PATH").unwrap_or(defaults.db_path),
            snapshots_dir: std::env::var("SNAPSHOTS_DIR").unwrap_or(defaults.snapshots_dir),
            ipfs_gateway: std::env::var("IPFS_GATEWAY").unwrap_or(defaults.ipfs_gateway),
            cache_size: parse_env_or("CACHE_SIZE", defaults.cache_size),
            cache_ttl_seconds: parse_env_or("CACHE_TTL_SECONDS", defaults.cache_ttl_seconds),
            rate_limit_per_minute: parse_env_or("RATE_LIMIT_PER_MINUTE", defaults.rate_limit_per_minute),
            sync_interval_seconds: parse_env_or("SYNC_INTERVAL_SECONDS", defaults.sync_interval_seconds),
        }
    }
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

const LATENCY_SAMPLE_WINDOW: usize = 1000;

/// Counters and latency samples backing the `/metrics` text response (§6).
/// No metrics crate: plain atomics plus a bounded ring buffer, the same
/// hand-rolled economy the rest of this crate's observability uses.
#[derive(Debug, Default)]
pub struct Metrics {
    queries_total: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    latency_samples_micros: Mutex<VecDeque<u64>>,
}

impl Metrics {
    /// Record one completed `/lookup` query.
    pub fn record_query(&self, latency: std::time::Duration, cache_hit: bool) {
        self.queries_total.fetch_add(1, Ordering::Relaxed);
        if cache_hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
        }
        let mut samples = self.latency_samples_micros.lock();
        if samples.len() == LATENCY_SAMPLE_WINDOW {
            samples.pop_front();
        }
        samples.push_back(latency.as_micros() as u64);
    }

    /// Total `/lookup` queries served since process start.
    pub fn queries_total(&self) -> u64 {
        self.queries_total.load(Ordering::Relaxed)
    }

    /// Fraction of queries served from the resolution cache, `0.0` with no
    /// traffic yet.
    pub fn cache_hit_rate(&self) -> f64 {
        let hits = self.cache_hits.load(Ordering::Relaxed) as f64;
        let misses = self.cache_misses.load(Ordering::Relaxed) as f64;
        let total = hits + misses;
        if total == 0.0 {
            0.0
        } else {
            hits / total
        }
    }

    /// The `quantile`-th latency, in seconds, over the last
    /// [`LATENCY_SAMPLE_WINDOW`] queries. `quantile` is clamped to `[0, 1]`.
    pub fn latency_quantile_seconds(&self, quantile: f64) -> f64 {
        let samples = self.latency_samples_micros.lock();
        if samples.is_empty() {
            return 0.0;
        }
        let mut sorted: Vec<u64> = samples.iter().copied().collect();
        sorted.sort_unstable();
        let quantile = quantile.clamp(0.0, 1.0);
        let index = ((sorted.len() - 1) as f64 * quantile).round() as usize;
        sorted[index] as f64 / 1_000_000.0
    }
}

/// Shared service state: the boundary source, the currently published
/// snapshot (swapped wholesale on sync, never mutated in place), the
/// resolution cache, config, and metrics (§6).
pub struct ServiceState {
    /// Boundary candidate source (C4).
    pub source: Arc<dyn BoundarySource + Send + Sync>,
    /// The currently served Atlas snapshot (C12), swappable on resync.
    pub snapshot: RwLock<Arc<AtlasSnapshot>>,
    /// Resolution cache (C5), shared across requests.
    pub cache: ResolutionCache,
    /// Runtime configuration.
    pub config: RuntimeConfig,
    /// `/metrics` counters.
    pub metrics: Metrics,
    /// Process start time, for uptime reporting.
    pub started_at: DateTime<Utc>,
}

impl ServiceState {
    /// Construct service state around an already-built snapshot and
    /// boundary source.
    pub fn new(
        source: Arc<dyn BoundarySource + Send + Sync>,
        snapshot: AtlasSnapshot,
        config: RuntimeConfig,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            source,
            snapshot: RwLock::new(Arc::new(snapshot)),
            cache: ResolutionCache::new(config.cache_size),
            config,
            metrics: Metrics::default(),
            started_at,
        }
    }

    /// Replace the served snapshot, e.g. after a sync picks up a newer
    /// published version (§6 `SYNC_INTERVAL_SECONDS`).
    pub fn replace_snapshot(&self, snapshot: AtlasSnapshot) {
        *self.snapshot.write() = Arc::new(snapshot);
    }
}

//! Resolution cache, keyed by `(normalized_address, geocoder_version,
//! atlas_version)` (§3).

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

use crate::canonical::canonical_hash_hex;
use crate::types::Resolution;

#[derive(serde::Serialize)]
struct ResolutionCacheKey<'a> {
    normalized_address: &'a str,
    geocoder_version: &'a str,
    atlas_version: &'a str,
}

fn key(normalized_address: &str, geocoder_version: &str, atlas_version: &str) -> String {
    canonical_hash_hex(&ResolutionCacheKey {
        normalized_address,
        geocoder_version,
        atlas_version,
    })
}

/// LRU cache of resolved address lookups.
pub struct ResolutionCache {
    inner: Mutex<LruCache<String, Vec<Resolution>>>,
}

impl ResolutionCache {
    /// A cache holding up to `capacity` distinct addresses.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity clamped to at least 1");
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Fetch a cached resolution set, if present (freshness is the
    /// caller's responsibility via [`Resolution::is_fresh`]).
    pub fn get(&self, normalized_address: &str, geocoder_version: &str, atlas_version: &str) -> Option<Vec<Resolution>> {
        let k = key(normalized_address, geocoder_version, atlas_version);
        self.inner.lock().get(&k).cloned()
    }

    /// Cache a resolution set.
    pub fn put(&self, normalized_address: &str, geocoder_version: &str, atlas_version: &str, resolutions: Vec<Resolution>) {
        let k = key(normalized_address, geocoder_version, atlas_version);
        self.inner.lock().put(k, resolutions);
    }
}

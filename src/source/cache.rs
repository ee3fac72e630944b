//! Content-addressed response cache shared by every [`super::BoundarySource`]
//! variant, keyed by `(source_url, snapshot_version, retrieval_date)` (§4.4).

use chrono::NaiveDate;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

use crate::canonical::canonical_hash_hex;
use crate::types::Boundary;

/// The cache key components, hashed together for a stable lookup key.
#[derive(Debug, Clone, serde::Serialize)]
struct CacheKeyParts<'a> {
    source_url: &'a str,
    snapshot_version: &'a str,
    retrieval_date: NaiveDate,
}

fn cache_key(source_url: &str, snapshot_version: &str, retrieval_date: NaiveDate) -> String {
    canonical_hash_hex(&CacheKeyParts {
        source_url,
        snapshot_version,
        retrieval_date,
    })
}

/// An LRU cache of boundary responses, content-addressed rather than
/// keyed by insertion order or wall-clock TTL.
pub struct ContentAddressedCache {
    inner: Mutex<LruCache<String, Vec<Boundary>>>,
}

impl ContentAddressedCache {
    /// A cache holding up to `capacity` distinct responses.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity clamped to at least 1");
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Look up a cached response.
    pub fn get(&self, source_url: &str, snapshot_version: &str, retrieval_date: NaiveDate) -> Option<Vec<Boundary>> {
        let key = cache_key(source_url, snapshot_version, retrieval_date);
        self.inner.lock().get(&key).cloned()
    }

    /// Insert (or replace) a cached response.
    pub fn put(&self, source_url: &str, snapshot_version: &str, retrieval_date: NaiveDate, boundaries: Vec<Boundary>) {
        let key = cache_key(source_url, snapshot_version, retrieval_date);
        self.inner.lock().put(key, boundaries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_keys_hit_the_cache() {
        let cache = ContentAddressedCache::new(4);
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        cache.put("https://gis.example.gov", "v1", date, vec![]);
        assert!(cache.get("https://gis.example.gov", "v1", date).is_some());
    }

    #[test]
    fn differing_retrieval_date_is_a_distinct_key() {
        let cache = ContentAddressedCache::new(4);
        let d1 = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        cache.put("https://gis.example.gov", "v1", d1, vec![]);
        assert!(cache.get("https://gis.example.gov", "v1", d2).is_none());
    }

    #[test]
    fn eviction_respects_capacity() {
        let cache = ContentAddressedCache::new(1);
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        cache.put("https://a.gov", "v1", date, vec![]);
        cache.put("https://b.gov", "v1", date, vec![]);
        assert!(cache.get("https://a.gov", "v1", date).is_none());
        assert!(cache.get("https://b.gov", "v1", date).is_some());
    }
}

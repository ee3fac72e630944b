//! Canonical serialization for deterministic, non-cryptographic cache keys.
//!
//! Used by [`crate::source::cache`]'s content-addressed cache and
//! [`crate::resolver::cache`]'s resolution cache to turn a tuple of key
//! parts into a single stable string, without pulling in a cryptographic
//! hash for data that is never exposed outside the process.

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Serialize a value to canonical JSON bytes for hashing. Field order is
/// struct declaration order and Vec order is index order, so callers that
/// need a stable key must avoid `HashMap` in the hashed value.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("cache key types are always serializable")
}

/// Non-cryptographic hash of a serializable value (xxh64).
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    xxh64(&to_canonical_bytes(value), 0)
}

/// [`canonical_hash`], hex-encoded.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}

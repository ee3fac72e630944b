//! C10: the provenance log. Compact, append-only, compressed NDJSON,
//! FIPS-sharded to give 50+ independent files with no lock contention
//! across states (§4.10).

pub mod query;
pub mod shard;
pub mod staging;

pub use query::{query, QueryFilter};
pub use shard::{append_locked, shard_path};
pub use staging::{append_staging, merge_staging, staging_path};

use crate::types::ProvenanceEntryError;

/// Everything that can go wrong writing or reading the provenance log.
#[derive(Debug, thiserror::Error)]
pub enum ProvenanceLogError {
    /// Filesystem I/O failure.
    #[error("provenance log I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// An entry failed structural validation and was rejected, never
    /// silently dropped (§4.10).
    #[error("entry rejected: {0}")]
    Validation(#[from] ProvenanceEntryError),
    /// A shard's contents could not be parsed as NDJSON.
    #[error("malformed shard contents: {0}")]
    Malformed(String),
    /// Could not acquire the shard lock within the retry budget.
    #[error("lock acquisition timed out after {attempts} attempts")]
    LockTimeout {
        /// Attempts made before giving up.
        attempts: u32,
    },
}

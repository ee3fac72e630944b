//! Crate-wide error taxonomy.
//!
//! Every subsystem surfaces its own narrow error enum (`ResolverError`,
//! `ValidationError`, `OrchestratorError`, `ProvenanceLogError`, ...); this
//! module holds the handful of error kinds shared across subsystem
//! boundaries plus the umbrella `ShadowAtlasError` used by top-level
//! operations that can fail in more than one subsystem.
//!
//! No subsystem panics on untrusted input. The only abort-on-failure path
//! in the whole crate is [`CryptographicIntegrityFailure`], which is fatal
//! at startup by design (`hash::constants::load_and_verify`).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single geometry defect, named the way validation (C6) classifies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GeometryIssue {
    /// Ring's first and last point do not coincide.
    #[error("ring is not closed")]
    UnclosedRing,
    /// Ring has fewer than 4 points.
    #[error("ring has fewer than 4 points")]
    TooFewPoints,
    /// Exactly one self-intersection on a single ring.
    #[error("ring is a bowtie (single self-intersection)")]
    Bowtie,
    /// More than one self-intersection.
    #[error("ring self-intersects (kinks > 0)")]
    SelfIntersection,
    /// A hole ring shares a vertex with the exterior ring.
    #[error("hole ring overlaps the exterior ring")]
    HoleOverlap,
    /// A coordinate falls outside WGS84 ranges.
    #[error("coordinate out of WGS84 range")]
    CoordinateOutOfRange,
}

/// Geometry rejection, carrying which ring (0 = exterior, N = hole N-1) failed.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("invalid geometry in ring {ring}: {reason}")]
pub struct InvalidGeometry {
    /// Ring index: 0 is the exterior ring, 1.. are holes.
    pub ring: usize,
    /// The specific defect.
    pub reason: GeometryIssue,
}

/// §7 error taxonomy, user-facing lookup/proof failures.
#[derive(Debug, Clone, Error)]
pub enum ShadowAtlasError {
    /// Address could not be geocoded at all.
    #[error("address not geocodable")]
    GeocodeFailed,
    /// Geocode succeeded but confidence is below the configured floor.
    #[error("geocode confidence {confidence} below floor {floor}")]
    LowConfidence {
        /// Observed confidence (0-100).
        confidence: u8,
        /// Configured minimum.
        floor: u8,
    },
    /// Point resolved to no known boundary of any requested type.
    #[error("point outside all known jurisdictions")]
    NoBoundaries,
    /// Upstream data source failed.
    #[error("data source error: {message} (retryable={retryable})")]
    DataSourceError {
        /// Human-readable detail, never exposed to end users.
        message: String,
        /// Whether §4.8 retry policy applies.
        retryable: bool,
    },
    /// A boundary failed validation and was dropped.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(#[from] InvalidGeometry),
    /// Pinned hash constants do not match their integrity digest. Fatal.
    #[error("cryptographic integrity failure: constant table digest mismatch")]
    CryptographicIntegrityFailure,
    /// A snapshot's recomputed root does not match its stored root. Fatal
    /// for that snapshot only.
    #[error("snapshot integrity failure: recomputed root differs from stored root")]
    SnapshotIntegrityFailure,
    /// A Merkle path did not fold to the declared root, or the on-chain
    /// verifier rejected the proof.
    #[error("proof verification failed")]
    ProofVerificationFailure,
    /// Nullifier has already been consumed.
    #[error("nullifier already used")]
    NullifierReplay,
    /// Provenance shard lock could not be acquired in time.
    #[error("lock acquisition timed out after {attempts} attempts")]
    LockAcquisitionTimeout {
        /// Number of retries attempted before giving up.
        attempts: u32,
    },
}

impl ShadowAtlasError {
    /// The user-visible failure code from §7 ("no internal error text or
    /// stack is exposed").
    pub fn user_facing(&self) -> &'static str {
        match self {
            Self::GeocodeFailed | Self::LowConfidence { .. } => "not_recognized",
            Self::NoBoundaries => "out_of_coverage",
            Self::ProofVerificationFailure => "proof_rejected",
            Self::NullifierReplay => "already_claimed",
            Self::DataSourceError { .. }
            | Self::InvalidGeometry(_)
            | Self::CryptographicIntegrityFailure
            | Self::SnapshotIntegrityFailure
            | Self::LockAcquisitionTimeout { .. } => "unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_facing_never_leaks_internal_detail() {
        let err = ShadowAtlasError::DataSourceError {
            message: "connection reset by peer on 10.0.0.1:5432".to_string(),
            retryable: true,
        };
        assert_eq!(err.user_facing(), "unavailable");
        assert!(!err.user_facing().contains("10.0.0.1"));
    }

    #[test]
    fn low_confidence_maps_to_not_recognized() {
        let err = ShadowAtlasError::LowConfidence {
            confidence: 42,
            floor: 80,
        };
        assert_eq!(err.user_facing(), "not_recognized");
    }
}

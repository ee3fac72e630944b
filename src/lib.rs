//! # Shadow Atlas
//!
//! Geospatial resolution and cryptographic commitment subsystem that maps a
//! point or address to nested political/administrative boundaries and
//! produces a zero-knowledge-provable commitment of district membership
//! anchored by a Merkle root published on-chain.
//!
//! ## Data flow
//!
//! ```text
//! upstream portals --(C7 extraction)--> validated boundaries (C2/C6)
//!     --(C12 atlas builder)--> snapshot (root, leaves, tree)
//!     --(published to content-addressed store)--> anchored on-chain (C14)
//!
//! query: point/address --(C5 resolver)--> candidates (C3/C4)
//!     --(finest boundary)--> Merkle proof (C13) --(C1 hash)--> verification
//! ```
//!
//! ## Cryptographic consistency
//!
//! `hash_pair`/`hash_single` (C1) must produce byte-identical output in the
//! native builder/server, the browser/WASM prover, and the production
//! circuit (treated here as an external oracle). A constant-table digest
//! mismatch is the one startup-fatal failure in this crate; see
//! [`hash::constants`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod canonical;
pub mod chain;
pub mod discovery;
pub mod errors;
pub mod extraction;
pub mod geometry;
pub mod hash;
pub mod orchestrator;
pub mod proof;
pub mod provenance_log;
pub mod resolver;
pub mod retry;
pub mod snapshot;
pub mod source;
pub mod types;
pub mod validation;

#[cfg(feature = "service")]
pub mod service;

pub use errors::{GeometryIssue, InvalidGeometry, ShadowAtlasError};
pub use hash::{hash_pair, hash_single, FieldElement};
pub use proof::{lookup, lookup_point, verify_proof, LookupError, LookupResult, MerkleProof};
pub use resolver::{resolve, resolve_point};
pub use snapshot::AtlasSnapshot;
pub use types::{
    AuthorityLevel, BBox, Boundary, BoundaryType, Geometry as BoundaryGeometry, JobOptions,
    JobScope, JobState, JobStatus, Nullifier, Point, Provenance, ProvenanceEntry, Resolution,
};

#[cfg(feature = "service")]
pub use service::{create_router, ServiceState};

/// Schema version for [`AtlasSnapshot`] serialization and leaf encoding.
/// Bumping this invalidates every cached [`types::Resolution`] keyed on
/// `atlas_version` (§3).
pub const SHADOW_ATLAS_SCHEMA_VERSION: &str = snapshot::SNAPSHOT_SCHEMA_VERSION;

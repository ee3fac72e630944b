//! Core data model (§3): points, boundaries, provenance, resolutions, jobs.

pub mod point;
pub mod boundary_type;
pub mod authority;
pub mod provenance;
pub mod boundary;
pub mod resolution;
pub mod job;
pub mod provenance_entry;
pub mod nullifier;

pub use point::{BBox, Point};
pub use boundary_type::BoundaryType;
pub use authority::AuthorityLevel;
pub use provenance::{Provenance, SourceKind};
pub use boundary::{Boundary, Geometry, Ring};
pub use resolution::Resolution;
pub use job::{JobOptions, JobProgress, JobScope, JobState, JobStatus, TaskFailure};
pub use provenance_entry::{ProvenanceEntry, ProvenanceEntryError, QualitySignals};
pub use nullifier::Nullifier;

//! C4: boundary data sources, polymorphic over a shared capability trait.
//!
//! Every variant pre-filters by bounding box before any expensive lookup,
//! enforces the authority ordering on conflicting results, and caches
//! responses content-addressed by `(source_url, snapshot_version,
//! retrieval_date)` (§4.4).

pub mod cache;
pub mod geojson;
pub mod memory;
pub mod tigerweb;

#[cfg(feature = "sqlite")]
pub mod sqlite;

use async_trait::async_trait;

use crate::types::{BoundaryType, Point};

/// Shared error type across all [`BoundarySource`] implementations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceError {
    /// Upstream request failed; `retryable` mirrors §4.4's 429/5xx policy.
    #[error("source request failed: {message}")]
    RequestFailed {
        /// Human-readable detail.
        message: String,
        /// Whether §4.8 retry policy applies.
        retryable: bool,
    },
    /// Response could not be parsed into boundary records.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// Boundary lookup by id found nothing.
    #[error("boundary not found: {0}")]
    NotFound(String),
}

/// Capability set every boundary source variant implements (§4.4):
/// candidate lookup by point, lookup by jurisdiction FIPS, lookup by id.
#[async_trait]
pub trait BoundarySource: Send + Sync {
    /// Candidate boundaries whose bbox contains `point`, optionally filtered
    /// to the given [`BoundaryType`]s.
    async fn candidates_for_point(
        &self,
        point: Point,
        types: Option<&[BoundaryType]>,
    ) -> Result<Vec<crate::types::Boundary>, SourceError>;

    /// All boundaries under a jurisdiction FIPS code.
    async fn by_jurisdiction(&self, fips: &str) -> Result<Vec<crate::types::Boundary>, SourceError>;

    /// A single boundary by its stable id.
    async fn by_id(&self, id: &str) -> Result<crate::types::Boundary, SourceError>;
}

pub use cache::ContentAddressedCache;
pub use geojson::CachedGeoJsonSource;
pub use memory::InMemorySource;
pub use tigerweb::TigerWebSource;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSource;

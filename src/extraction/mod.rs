//! C7: per-portal extraction providers, translating an upstream format into
//! validated [`crate::types::Boundary`] records.

pub mod arcgis;
pub mod raw_attributes;
pub mod shapefile;
pub mod tiger;
pub mod wards;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::Boundary;

/// Result of extracting one `(state, layer)` pair (§4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// State FIPS or postal code.
    pub state: String,
    /// Boundary layer name.
    pub layer: String,
    /// Boundaries extracted.
    pub boundaries: Vec<Boundary>,
    /// Number of features extracted.
    pub feature_count: u64,
    /// Expected count, if known from the registry.
    pub expected_count: Option<u64>,
    /// Whether extraction completed without error.
    pub success: bool,
}

/// Error surfaced by an [`ExtractionProvider`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExtractionError {
    /// Upstream fetch failed.
    #[error("fetch failed: {message} (retryable={retryable})")]
    FetchFailed {
        /// Human-readable detail.
        message: String,
        /// Whether §4.8 retry policy applies.
        retryable: bool,
    },
    /// Response could not be parsed into the provider's expected schema.
    #[error("parse failed: {0}")]
    ParseFailed(String),
    /// Coordinate reprojection failed.
    #[error("reprojection failed: {0}")]
    ReprojectionFailed(String),
}

impl From<crate::source::SourceError> for ExtractionError {
    fn from(e: crate::source::SourceError) -> Self {
        match e {
            crate::source::SourceError::RequestFailed { message, retryable } => {
                ExtractionError::FetchFailed { message, retryable }
            }
            crate::source::SourceError::MalformedResponse(m) => ExtractionError::ParseFailed(m),
            crate::source::SourceError::NotFound(id) => ExtractionError::ParseFailed(format!("not found: {id}")),
        }
    }
}

/// Per-portal extraction adapter (§4.7).
#[async_trait]
pub trait ExtractionProvider: Send + Sync {
    /// Extract every boundary for `(state, layer)`, paginating under the
    /// provider's own page-size limits.
    async fn extract(&self, state: &str, layer: &str) -> Result<ExtractionResult, ExtractionError>;
}

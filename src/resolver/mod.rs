//! C5: the hierarchical resolver. `resolve(address)` is a pure,
//! single-threaded cooperative computation with exactly two suspension
//! points — the geocode call and the data-source call (§5).

pub mod cache;
pub mod geocoder;

use chrono::{DateTime, Utc};

use crate::errors::ShadowAtlasError;
use crate::geometry;
use crate::source::BoundarySource;
use crate::types::{BoundaryType, Point, Resolution};

pub use cache::ResolutionCache;
pub use geocoder::{FixedGeocoder, GeocodeError, GeocodeResult, Geocoder};

/// Minimum geocode confidence accepted, absent an override (§4.5).
pub const DEFAULT_CONFIDENCE_FLOOR: u8 = 80;

/// Normalize an address per §4.5 step 1: lowercase, trim, default country.
pub fn normalize_address(raw: &str, default_country: &str) -> String {
    let trimmed = raw.trim().to_lowercase();
    if trimmed.split(',').count() >= 2 || trimmed.is_empty() {
        trimmed
    } else {
        format!("{trimmed}, {}", default_country.to_lowercase())
    }
}

/// Resolve `address` to zero or more [`Resolution`]s, finest-precision
/// first (§4.5 ordering guarantee). `atlas_version` feeds the cache key so
/// a snapshot rebuild never serves a stale cross-version hit.
pub async fn resolve(
    address: &str,
    default_country: &str,
    confidence_floor: u8,
    geocoder: &dyn Geocoder,
    geocoder_version: &str,
    source: &dyn BoundarySource,
    atlas_version: &str,
    requested_types: Option<&[BoundaryType]>,
    cache: &ResolutionCache,
    now: DateTime<Utc>,
) -> Result<Vec<Resolution>, ShadowAtlasError> {
    let normalized = normalize_address(address, default_country);

    if let Some(cached) = cache.get(&normalized, geocoder_version, atlas_version) {
        if cached.first().map_or(true, |r| r.is_fresh(now)) {
            return Ok(cached);
        }
    }

    let geocoded = geocoder
        .geocode(&normalized)
        .await
        .map_err(|_: GeocodeError| ShadowAtlasError::GeocodeFailed)?;

    if geocoded.confidence < confidence_floor {
        return Err(ShadowAtlasError::LowConfidence {
            confidence: geocoded.confidence,
            floor: confidence_floor,
        });
    }

    let candidates = source
        .candidates_for_point(geocoded.point, requested_types)
        .await
        .map_err(|e| ShadowAtlasError::DataSourceError {
            message: e.to_string(),
            retryable: matches!(e, crate::source::SourceError::RequestFailed { retryable: true, .. }),
        })?;

    let mut resolutions = geometry::find_containing(geocoded.point, &candidates, now);
    if resolutions.is_empty() {
        return Err(ShadowAtlasError::NoBoundaries);
    }

    for (resolution, boundary) in resolutions.iter_mut().zip(matching_boundaries(&candidates, &resolutions)) {
        resolution.confidence = blended_confidence(geocoded.confidence, geocoded.point, boundary);
    }

    cache.put(&normalized, geocoder_version, atlas_version, resolutions.clone());
    Ok(resolutions)
}

/// Resolve an already-known coordinate (the HTTP `/lookup?lat=&lon=`
/// surface, §6) against `source`, skipping the geocode suspension point
/// entirely — the caller already has a point, not an address (§4.5 notes
/// the geocode step is the only address-specific part of resolution).
pub async fn resolve_point(
    point: Point,
    source: &dyn BoundarySource,
    requested_types: Option<&[BoundaryType]>,
    now: DateTime<Utc>,
) -> Result<Vec<Resolution>, ShadowAtlasError> {
    let candidates = source
        .candidates_for_point(point, requested_types)
        .await
        .map_err(|e| ShadowAtlasError::DataSourceError {
            message: e.to_string(),
            retryable: matches!(e, crate::source::SourceError::RequestFailed { retryable: true, .. }),
        })?;

    let mut resolutions = geometry::find_containing(point, &candidates, now);
    if resolutions.is_empty() {
        return Err(ShadowAtlasError::NoBoundaries);
    }

    for (resolution, boundary) in resolutions.iter_mut().zip(matching_boundaries(&candidates, &resolutions)) {
        resolution.confidence = blended_confidence(100, point, boundary);
    }

    Ok(resolutions)
}

fn matching_boundaries<'a>(
    candidates: &'a [crate::types::Boundary],
    resolutions: &[Resolution],
) -> Vec<&'a crate::types::Boundary> {
    resolutions
        .iter()
        .filter_map(|r| candidates.iter().find(|b| b.id == r.boundary_id))
        .collect()
}

/// Confidence blends the geocoder's own confidence with how close the
/// query point sits to the matched boundary's nearest edge (§4.5 step 5):
/// points well inside keep the geocoder's confidence; points near an edge
/// are discounted, since a small geocode error could have placed them on
/// the wrong side.
fn blended_confidence(geocode_confidence: u8, point: crate::types::Point, boundary: &crate::types::Boundary) -> u8 {
    let edge_distance = geometry::distance_to_nearest_edge(point, &boundary.geometry);
    let discount = if edge_distance < 1e-4 { 10 } else { 0 };
    geocode_confidence.saturating_sub(discount)
}

//! Shapefile extraction provider (§4.7): projects coordinates to EPSG:4326
//! when the source shapefile isn't already in geographic coordinates.
//!
//! Binary `.shp`/`.dbf` decoding happens upstream of this module (treated
//! as an external concern, the way the hash module treats the proving
//! circuit as an oracle); this provider consumes already-decoded records
//! and owns the part §4.7 calls out explicitly: reprojection and
//! provenance attachment.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::types::{AuthorityLevel, Boundary, BoundaryType, Geometry, Point, Provenance, Ring, SourceKind};

use super::{ExtractionError, ExtractionProvider, ExtractionResult};

/// A shapefile's declared projection, as read from its `.prj` sidecar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceProjection {
    /// Already WGS84 (EPSG:4326); no reprojection needed.
    Wgs84,
    /// Web Mercator (EPSG:3857), common in web-published shapefiles.
    WebMercator,
}

/// One decoded shapefile record, prior to reprojection.
#[derive(Debug, Clone)]
pub struct ShapefileRecord {
    /// The feature's GEOID/id attribute.
    pub geoid: String,
    /// The feature's name attribute.
    pub name: String,
    /// Exterior ring, in the shapefile's native projection.
    pub exterior: Vec<(f64, f64)>,
    /// Hole rings, in the shapefile's native projection.
    pub holes: Vec<Vec<(f64, f64)>>,
}

const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Reproject a single Web Mercator (EPSG:3857) coordinate to WGS84 degrees.
fn web_mercator_to_wgs84(x: f64, y: f64) -> (f64, f64) {
    let lng = x / EARTH_RADIUS_M * 180.0 / std::f64::consts::PI;
    let lat = (2.0 * (y / EARTH_RADIUS_M).exp().atan() - std::f64::consts::FRAC_PI_2) * 180.0 / std::f64::consts::PI;
    (lng, lat)
}

fn reproject_ring(ring: &[(f64, f64)], projection: SourceProjection) -> Result<Ring, ExtractionError> {
    ring.iter()
        .map(|&(x, y)| {
            let (lng, lat) = match projection {
                SourceProjection::Wgs84 => (x, y),
                SourceProjection::WebMercator => web_mercator_to_wgs84(x, y),
            };
            Point::new(lng, lat).ok_or_else(|| {
                ExtractionError::ReprojectionFailed(format!("reprojected point ({lng}, {lat}) out of WGS84 range"))
            })
        })
        .collect()
}

/// A shapefile-backed extraction provider.
pub struct ShapefileProvider {
    source_path: String,
    boundary_type: BoundaryType,
    authority: AuthorityLevel,
    projection: SourceProjection,
}

impl ShapefileProvider {
    /// Build a provider over an already-decoded record set.
    pub fn new(source_path: impl Into<String>, boundary_type: BoundaryType, authority: AuthorityLevel, projection: SourceProjection) -> Self {
        Self {
            source_path: source_path.into(),
            boundary_type,
            authority,
            projection,
        }
    }

    /// Reproject and assemble decoded shapefile records into boundaries.
    pub fn assemble(&self, records: &[ShapefileRecord], retrieved_at: DateTime<Utc>) -> Result<Vec<Boundary>, ExtractionError> {
        records
            .iter()
            .map(|record| {
                let exterior = reproject_ring(&record.exterior, self.projection)?;
                let holes = record
                    .holes
                    .iter()
                    .map(|h| reproject_ring(h, self.projection))
                    .collect::<Result<Vec<_>, _>>()?;
                let geometry = Geometry::Polygon { exterior, holes };
                let bbox = geometry
                    .recompute_bbox()
                    .ok_or_else(|| ExtractionError::ParseFailed("empty exterior ring".to_string()))?;
                Ok(Boundary {
                    id: record.geoid.clone(),
                    r#type: self.boundary_type,
                    name: record.name.clone(),
                    jurisdiction: record.geoid.clone(),
                    jurisdiction_fips: record.geoid.get(0..2).unwrap_or_default().to_string(),
                    geometry,
                    bbox,
                    valid_from: retrieved_at,
                    valid_until: None,
                    provenance: Provenance {
                        source_kind: SourceKind::StateGis,
                        source_url: self.source_path.clone(),
                        retrieved_at,
                        data_version: None,
                        license: None,
                        processing_steps: vec![format!("reprojected from {:?}", self.projection)],
                        authority_level: self.authority,
                        last_verified: retrieved_at,
                    },
                    raw_attributes: BTreeMap::new(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl ExtractionProvider for ShapefileProvider {
    async fn extract(&self, _state: &str, _layer: &str) -> Result<ExtractionResult, ExtractionError> {
        Err(ExtractionError::FetchFailed {
            message: "ShapefileProvider::extract requires pre-decoded records; use assemble()".to_string(),
            retryable: false,
        })
    }
}

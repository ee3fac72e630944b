//! Cached GeoJSON [`BoundarySource`] (C4): municipal portals that publish a
//! static `FeatureCollection` file, loaded once and served from memory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::types::{AuthorityLevel, Boundary, BoundaryType, Geometry, Point, Provenance, Ring, SourceKind};

use super::{BoundarySource, SourceError};

/// A boundary source backed by a single parsed GeoJSON `FeatureCollection`.
#[derive(Debug, Clone, Default)]
pub struct CachedGeoJsonSource {
    boundaries: Vec<Boundary>,
}

impl CachedGeoJsonSource {
    /// Parse `contents` as a GeoJSON `FeatureCollection`, stamping every
    /// resulting boundary with `boundary_type` and `source_url` provenance.
    pub fn from_geojson(
        contents: &str,
        boundary_type: BoundaryType,
        source_url: &str,
        retrieved_at: DateTime<Utc>,
    ) -> Result<Self, SourceError> {
        let root: Value =
            serde_json::from_str(contents).map_err(|e| SourceError::MalformedResponse(e.to_string()))?;
        let features = root
            .get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| SourceError::MalformedResponse("missing features array".to_string()))?;

        let mut boundaries = Vec::with_capacity(features.len());
        for feature in features {
            boundaries.push(parse_feature(feature, boundary_type, source_url, retrieved_at)?);
        }
        Ok(Self { boundaries })
    }

    /// Number of loaded boundaries.
    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    /// Whether no boundaries were loaded.
    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    /// Borrow the loaded boundaries, e.g. for an extraction provider (C7)
    /// that parses upstream GeoJSON through this source and then needs the
    /// parsed records directly rather than through [`BoundarySource`].
    pub fn boundaries(&self) -> &[Boundary] {
        &self.boundaries
    }

    /// Consume the source, taking ownership of its boundaries.
    pub fn into_boundaries(self) -> Vec<Boundary> {
        self.boundaries
    }
}

fn parse_feature(
    feature: &Value,
    boundary_type: BoundaryType,
    source_url: &str,
    retrieved_at: DateTime<Utc>,
) -> Result<Boundary, SourceError> {
    let properties = feature.get("properties").cloned().unwrap_or(Value::Null);
    let id = properties
        .get("GEOID")
        .and_then(Value::as_str)
        .or_else(|| properties.get("id").and_then(Value::as_str))
        .ok_or_else(|| SourceError::MalformedResponse("feature missing GEOID/id property".to_string()))?
        .to_string();
    let name = properties
        .get("NAME")
        .and_then(Value::as_str)
        .unwrap_or(&id)
        .to_string();

    let geometry_value = feature
        .get("geometry")
        .ok_or_else(|| SourceError::MalformedResponse("feature missing geometry".to_string()))?;
    let geometry = parse_geometry(geometry_value)?;
    let bbox = geometry
        .recompute_bbox()
        .ok_or_else(|| SourceError::MalformedResponse("geometry has no points".to_string()))?;

    let raw_attributes: BTreeMap<String, Value> = properties
        .as_object()
        .map(|obj| obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default();

    Ok(Boundary {
        id: id.clone(),
        r#type: boundary_type,
        name,
        jurisdiction: id.clone(),
        jurisdiction_fips: id.get(0..2).unwrap_or_default().to_string(),
        geometry,
        bbox,
        valid_from: retrieved_at,
        valid_until: None,
        provenance: Provenance {
            source_kind: SourceKind::MunicipalGis,
            source_url: source_url.to_string(),
            retrieved_at,
            data_version: None,
            license: None,
            processing_steps: vec!["loaded from cached GeoJSON".to_string()],
            authority_level: AuthorityLevel::Municipal,
            last_verified: retrieved_at,
        },
        raw_attributes,
    })
}

fn parse_ring(coords: &Value) -> Result<Ring, SourceError> {
    coords
        .as_array()
        .ok_or_else(|| SourceError::MalformedResponse("ring is not an array".to_string()))?
        .iter()
        .map(|pair| {
            let arr = pair
                .as_array()
                .ok_or_else(|| SourceError::MalformedResponse("coordinate is not an array".to_string()))?;
            let lng = arr.first().and_then(Value::as_f64);
            let lat = arr.get(1).and_then(Value::as_f64);
            match (lng, lat) {
                (Some(lng), Some(lat)) => Point::new(lng, lat)
                    .ok_or_else(|| SourceError::MalformedResponse("coordinate out of WGS84 range".to_string())),
                _ => Err(SourceError::MalformedResponse("coordinate missing lng/lat".to_string())),
            }
        })
        .collect()
}

fn parse_geometry(value: &Value) -> Result<Geometry, SourceError> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| SourceError::MalformedResponse("geometry missing type".to_string()))?;
    let coordinates = value
        .get("coordinates")
        .ok_or_else(|| SourceError::MalformedResponse("geometry missing coordinates".to_string()))?;

    match kind {
        "Polygon" => {
            let rings = coordinates
                .as_array()
                .ok_or_else(|| SourceError::MalformedResponse("Polygon coordinates malformed".to_string()))?;
            let mut rings = rings.iter();
            let exterior = parse_ring(rings.next().ok_or_else(|| {
                SourceError::MalformedResponse("Polygon has no exterior ring".to_string())
            })?)?;
            let holes = rings.map(parse_ring).collect::<Result<Vec<_>, _>>()?;
            Ok(Geometry::Polygon { exterior, holes })
        }
        "MultiPolygon" => {
            let polys = coordinates
                .as_array()
                .ok_or_else(|| SourceError::MalformedResponse("MultiPolygon coordinates malformed".to_string()))?;
            let mut out = Vec::with_capacity(polys.len());
            for poly in polys {
                let rings = poly
                    .as_array()
                    .ok_or_else(|| SourceError::MalformedResponse("polygon entry malformed".to_string()))?;
                let mut rings = rings.iter();
                let exterior = parse_ring(rings.next().ok_or_else(|| {
                    SourceError::MalformedResponse("polygon entry has no exterior ring".to_string())
                })?)?;
                let holes = rings.map(parse_ring).collect::<Result<Vec<_>, _>>()?;
                out.push((exterior, holes));
            }
            Ok(Geometry::MultiPolygon(out))
        }
        other => Err(SourceError::MalformedResponse(format!("unsupported geometry type {other}"))),
    }
}

#[async_trait]
impl BoundarySource for CachedGeoJsonSource {
    async fn candidates_for_point(
        &self,
        point: Point,
        types: Option<&[BoundaryType]>,
    ) -> Result<Vec<Boundary>, SourceError> {
        Ok(self
            .boundaries
            .iter()
            .filter(|b| b.bbox.contains(point))
            .filter(|b| types.map_or(true, |ts| ts.contains(&b.r#type)))
            .cloned()
            .collect())
    }

    async fn by_jurisdiction(&self, fips: &str) -> Result<Vec<Boundary>, SourceError> {
        Ok(self
            .boundaries
            .iter()
            .filter(|b| b.jurisdiction_fips == fips)
            .cloned()
            .collect())
    }

    async fn by_id(&self, id: &str) -> Result<Boundary, SourceError> {
        self.boundaries
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(id.to_string()))
    }
}

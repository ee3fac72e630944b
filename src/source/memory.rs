//! In-memory [`BoundarySource`], used in tests and as the resolver's default
//! fixture source.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::types::{Boundary, BoundaryType, Point};

use super::{BoundarySource, SourceError};

/// Holds boundaries in a `BTreeMap` keyed by id for deterministic iteration.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    boundaries: BTreeMap<String, Boundary>,
}

impl InMemorySource {
    /// An empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a boundary.
    pub fn insert(&mut self, boundary: Boundary) {
        self.boundaries.insert(boundary.id.clone(), boundary);
    }
}

#[async_trait]
impl BoundarySource for InMemorySource {
    async fn candidates_for_point(
        &self,
        point: Point,
        types: Option<&[BoundaryType]>,
    ) -> Result<Vec<Boundary>, SourceError> {
        Ok(self
            .boundaries
            .values()
            .filter(|b| b.bbox.contains(point))
            .filter(|b| types.map_or(true, |ts| ts.contains(&b.r#type)))
            .cloned()
            .collect())
    }

    async fn by_jurisdiction(&self, fips: &str) -> Result<Vec<Boundary>, SourceError> {
        Ok(self
            .boundaries
            .values()
            .filter(|b| b.jurisdiction_fips == fips)
            .cloned()
            .collect())
    }

    async fn by_id(&self, id: &str) -> Result<Boundary, SourceError> {
        self.boundaries
            .get(id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AuthorityLevel, Geometry, Provenance, SourceKind};
    use chrono::DateTime;

    fn square_boundary(id: &str) -> Boundary {
        let exterior = vec![
            crate::types::Point::new(0.0, 0.0).unwrap(),
            crate::types::Point::new(10.0, 0.0).unwrap(),
            crate::types::Point::new(10.0, 10.0).unwrap(),
            crate::types::Point::new(0.0, 10.0).unwrap(),
            crate::types::Point::new(0.0, 0.0).unwrap(),
        ];
        let geometry = Geometry::Polygon { exterior, holes: vec![] };
        let bbox = geometry.recompute_bbox().unwrap();
        Boundary {
            id: id.to_string(),
            r#type: BoundaryType::County,
            name: id.to_string(),
            jurisdiction: "test".to_string(),
            jurisdiction_fips: "06".to_string(),
            geometry,
            bbox,
            valid_from: DateTime::from_timestamp(0, 0).unwrap(),
            valid_until: None,
            provenance: Provenance {
                source_kind: SourceKind::InMemory,
                source_url: "memory://test".to_string(),
                retrieved_at: DateTime::from_timestamp(0, 0).unwrap(),
                data_version: None,
                license: None,
                processing_steps: vec![],
                authority_level: AuthorityLevel::Unknown,
                last_verified: DateTime::from_timestamp(0, 0).unwrap(),
            },
            raw_attributes: Default::default(),
        }
    }

    #[tokio::test]
    async fn candidates_filtered_by_bbox() {
        let mut src = InMemorySource::new();
        src.insert(square_boundary("a"));
        let hits = src
            .candidates_for_point(crate::types::Point::new(5.0, 5.0).unwrap(), None)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        let misses = src
            .candidates_for_point(crate::types::Point::new(50.0, 50.0).unwrap(), None)
            .await
            .unwrap();
        assert!(misses.is_empty());
    }

    #[tokio::test]
    async fn by_id_not_found_is_an_error() {
        let src = InMemorySource::new();
        assert!(matches!(src.by_id("missing").await, Err(SourceError::NotFound(_))));
    }
}

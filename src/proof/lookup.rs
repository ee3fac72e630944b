//! `lookup(point | address) -> { boundary, merkle_proof }` (§4.13): the
//! resolver (C5) finds the finest valid boundary, then this module pulls
//! its proof path out of a published snapshot's sorted leaves.

use serde::{Deserialize, Serialize};

use crate::resolver::{Geocoder, ResolutionCache};
use crate::snapshot::{encode_leaf, AtlasSnapshot, LeafInput};
use crate::source::BoundarySource;
use crate::types::{Boundary, BoundaryType, Point, Resolution};

use super::MerkleProof;

/// A lookup failed for one of the §7 reasons surfaced further up the stack,
/// or because the resolved boundary isn't present in the requested snapshot.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LookupError {
    /// The underlying resolve call failed.
    #[error(transparent)]
    Resolve(#[from] crate::errors::ShadowAtlasError),
    /// The resolved boundary's leaf is not in the snapshot's sorted leaves
    /// (e.g. the snapshot predates this boundary's extraction run).
    #[error("boundary {0} resolved but is absent from the published snapshot")]
    NotInSnapshot(String),
}

/// The result of a successful lookup: the matched boundary plus its
/// inclusion proof against the snapshot's root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResult {
    /// The finest-precision valid boundary matched.
    pub boundary: Resolution,
    /// Its Merkle inclusion proof against `snapshot.root`.
    pub merkle_proof: MerkleProof,
}

/// Resolve `address` against `source`, then extract the matched boundary's
/// proof path from `snapshot` (§4.13 `lookup`).
#[allow(clippy::too_many_arguments)]
pub async fn lookup(
    address: &str,
    default_country: &str,
    confidence_floor: u8,
    geocoder: &dyn Geocoder,
    geocoder_version: &str,
    source: &dyn BoundarySource,
    snapshot: &AtlasSnapshot,
    requested_types: Option<&[BoundaryType]>,
    cache: &ResolutionCache,
    candidate_boundary: impl Fn(&str) -> Option<Boundary>,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<LookupResult, LookupError> {
    let resolutions = crate::resolver::resolve(
        address,
        default_country,
        confidence_floor,
        geocoder,
        geocoder_version,
        source,
        &snapshot.version.to_string(),
        requested_types,
        cache,
        now,
    )
    .await?;

    let best = resolutions.into_iter().next().ok_or_else(|| {
        LookupError::Resolve(crate::errors::ShadowAtlasError::NoBoundaries)
    })?;

    let boundary = candidate_boundary(&best.boundary_id)
        .ok_or_else(|| LookupError::NotInSnapshot(best.boundary_id.clone()))?;

    let input = LeafInput::from_boundary(&boundary, snapshot.version);
    let leaf = encode_leaf(&input).map_err(LookupError::Resolve)?;
    let index = snapshot
        .index_of(leaf)
        .ok_or_else(|| LookupError::NotInSnapshot(best.boundary_id.clone()))?;

    let tree = crate::snapshot::fold_tree(&snapshot.sorted_leaves).map_err(LookupError::Resolve)?;
    let (siblings, path_indices) = tree
        .proof_path(index)
        .ok_or_else(|| LookupError::NotInSnapshot(best.boundary_id.clone()))?;

    Ok(LookupResult {
        boundary: best,
        merkle_proof: MerkleProof {
            leaf: leaf.0,
            siblings,
            path_indices,
            declared_root: snapshot.root,
        },
    })
}

/// `lookup_point` is to `lookup` what [`crate::resolver::resolve_point`] is
/// to [`crate::resolver::resolve`]: the HTTP `/lookup?lat=&lon=` surface
/// (§6) already has a coordinate, so it skips geocoding and goes straight
/// to matching a boundary and pulling its proof path from `snapshot`.
pub async fn lookup_point(
    point: Point,
    source: &dyn BoundarySource,
    snapshot: &AtlasSnapshot,
    requested_types: Option<&[BoundaryType]>,
    candidate_boundary: impl Fn(&str) -> Option<Boundary>,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<LookupResult, LookupError> {
    let resolutions = crate::resolver::resolve_point(point, source, requested_types, now).await?;

    let best = resolutions.into_iter().next().ok_or_else(|| {
        LookupError::Resolve(crate::errors::ShadowAtlasError::NoBoundaries)
    })?;

    let boundary = candidate_boundary(&best.boundary_id)
        .ok_or_else(|| LookupError::NotInSnapshot(best.boundary_id.clone()))?;

    let input = LeafInput::from_boundary(&boundary, snapshot.version);
    let leaf = encode_leaf(&input).map_err(LookupError::Resolve)?;
    let index = snapshot
        .index_of(leaf)
        .ok_or_else(|| LookupError::NotInSnapshot(best.boundary_id.clone()))?;

    let tree = crate::snapshot::fold_tree(&snapshot.sorted_leaves).map_err(LookupError::Resolve)?;
    let (siblings, path_indices) = tree
        .proof_path(index)
        .ok_or_else(|| LookupError::NotInSnapshot(best.boundary_id.clone()))?;

    Ok(LookupResult {
        boundary: best,
        merkle_proof: MerkleProof {
            leaf: leaf.0,
            siblings,
            path_indices,
            declared_root: snapshot.root,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::FixedGeocoder;
    use crate::resolver::GeocodeResult;
    use crate::source::InMemorySource;
    use crate::types::{AuthorityLevel, Geometry, Point, Provenance, SourceKind};
    use chrono::DateTime;
    use std::collections::BTreeMap;

    fn honolulu_district() -> Boundary {
        let exterior = vec![
            Point::new(-158.0, 21.0).unwrap(),
            Point::new(-157.0, 21.0).unwrap(),
            Point::new(-157.0, 22.0).unwrap(),
            Point::new(-158.0, 22.0).unwrap(),
            Point::new(-158.0, 21.0).unwrap(),
        ];
        let geometry = Geometry::Polygon { exterior, holes: vec![] };
        let bbox = geometry.recompute_bbox().unwrap();
        Boundary {
            id: "usa-hi-honolulu-district-1".to_string(),
            r#type: BoundaryType::CouncilDistrict,
            name: "Honolulu City Council District 1".to_string(),
            jurisdiction: "Honolulu".to_string(),
            jurisdiction_fips: "1500300".to_string(),
            geometry,
            bbox,
            valid_from: DateTime::from_timestamp(0, 0).unwrap(),
            valid_until: None,
            provenance: Provenance {
                source_kind: SourceKind::MunicipalGis,
                source_url: "https://gis.honolulu.gov".to_string(),
                retrieved_at: DateTime::from_timestamp(0, 0).unwrap(),
                data_version: None,
                license: None,
                processing_steps: vec![],
                authority_level: AuthorityLevel::Municipal,
                last_verified: DateTime::from_timestamp(0, 0).unwrap(),
            },
            raw_attributes: Default::default(),
        }
    }

    #[tokio::test]
    async fn honolulu_lookup_produces_a_verifiable_proof() {
        let boundary = honolulu_district();
        let mut source = InMemorySource::new();
        source.insert(boundary.clone());

        let mut map = BTreeMap::new();
        map.insert(("15".to_string(), "council".to_string()), vec![boundary.clone()]);
        let snapshot = crate::snapshot::build_snapshot(
            &map,
            1,
            &Default::default(),
            vec![],
            DateTime::from_timestamp(0, 0).unwrap(),
        )
        .unwrap();

        let mut geocoder = FixedGeocoder::new();
        geocoder.insert(
            "123 south king st, honolulu, hi, us",
            GeocodeResult { point: Point::new(-157.8581, 21.3099).unwrap(), confidence: 95 },
        );

        let cache = ResolutionCache::new(10);
        let boundary_clone = boundary.clone();
        let result = lookup(
            "123 South King St, Honolulu, HI",
            "us",
            80,
            &geocoder,
            "geo-v1",
            &source,
            &snapshot,
            None,
            &cache,
            move |id| if id == boundary_clone.id { Some(boundary_clone.clone()) } else { None },
            DateTime::from_timestamp(1000, 0).unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(result.boundary.boundary_id, "usa-hi-honolulu-district-1");
        assert!(super::super::verify_proof(&result.merkle_proof).unwrap());
    }

    #[tokio::test]
    async fn honolulu_lookup_point_skips_geocoding() {
        let boundary = honolulu_district();
        let mut source = InMemorySource::new();
        source.insert(boundary.clone());

        let mut map = BTreeMap::new();
        map.insert(("15".to_string(), "council".to_string()), vec![boundary.clone()]);
        let snapshot = crate::snapshot::build_snapshot(
            &map,
            1,
            &Default::default(),
            vec![],
            DateTime::from_timestamp(0, 0).unwrap(),
        )
        .unwrap();

        let boundary_clone = boundary.clone();
        let result = lookup_point(
            Point::new(-157.8581, 21.3099).unwrap(),
            &source,
            &snapshot,
            None,
            move |id| if id == boundary_clone.id { Some(boundary_clone.clone()) } else { None },
            DateTime::from_timestamp(1000, 0).unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(result.boundary.boundary_id, "usa-hi-honolulu-district-1");
        assert!(super::super::verify_proof(&result.merkle_proof).unwrap());
    }
}

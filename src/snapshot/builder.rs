//! `build_snapshot`: the full C12 pipeline (§4.12 steps 1-6).

use std::collections::BTreeMap;

use crate::errors::ShadowAtlasError;
use crate::hash::PINNED_CONSTANT_TABLE_DIGEST_HEX;
use crate::types::Boundary;
use crate::validation::{check_count, CountMismatch, CrossSourceDiscrepancy, ExpectedCountRegistry};

use super::leaf::{encode_leaf, LeafInput};
use super::manifest::AtlasManifest;
use super::merkle::fold_tree;
use super::AtlasSnapshot;

/// Build an [`AtlasSnapshot`] from validated boundaries grouped by
/// `(state, layer)`, per §4.12. `boundaries_by_state_layer` is expected to
/// contain only boundaries that already passed C6 validation; this
/// function does not re-run geometry checks.
pub fn build_snapshot(
    boundaries_by_state_layer: &BTreeMap<(String, String), Vec<Boundary>>,
    version_epoch: u64,
    registry: &ExpectedCountRegistry,
    cross_source_discrepancies: Vec<CrossSourceDiscrepancy>,
    built_at: chrono::DateTime<chrono::Utc>,
) -> Result<AtlasSnapshot, ShadowAtlasError> {
    let mut manifest = AtlasManifest {
        expected_counts: BTreeMap::new(),
        actual_counts: BTreeMap::new(),
        count_discrepancies: Vec::new(),
        cross_source_discrepancies,
        authority_summary: BTreeMap::new(),
        hash_constants_digest: PINNED_CONSTANT_TABLE_DIGEST_HEX.to_string(),
        processing_steps: vec!["leaf_encode".into(), "canonical_sort".into(), "merkle_fold".into()],
        built_at,
    };

    for ((expected_state, expected_layer), count) in registry {
        manifest
            .expected_counts
            .entry(expected_state.clone())
            .or_default()
            .insert(expected_layer.clone(), *count);
    }

    // Step 1: encode each boundary to a leaf, carrying its sort key.
    let mut keyed_leaves: Vec<((u8, String, String), [u8; 32])> = Vec::new();
    let mut all_boundaries: Vec<&Boundary> = Vec::new();

    for ((state, layer), boundaries) in boundaries_by_state_layer {
        manifest.record_actual_count(state, layer, boundaries.len() as u64);
        if let Some(mismatch) = check_count(registry, state, layer, boundaries.len() as u64) {
            manifest.count_discrepancies.push(mismatch);
        }
        for boundary in boundaries {
            let input = LeafInput::from_boundary(boundary, version_epoch);
            let sort_key = (input.boundary_type_ordinal, input.jurisdiction_fips.clone(), input.geoid.clone());
            let leaf = encode_leaf(&input)?;
            keyed_leaves.push((sort_key, leaf.0));
            all_boundaries.push(boundary);
            *manifest
                .authority_summary
                .entry(boundary.provenance.authority_level)
                .or_insert(0) += 1;
        }
    }

    // Step 2: sort by the canonical total order.
    keyed_leaves.sort_by(|a, b| a.0.cmp(&b.0));
    let sorted_leaves: Vec<[u8; 32]> = keyed_leaves.into_iter().map(|(_, leaf)| leaf).collect();

    // Steps 3-4: fold the Merkle tree and record every level.
    let tree = fold_tree(&sorted_leaves)?;
    let root = tree.root();
    let merkle_levels = tree.levels_bytes();

    Ok(AtlasSnapshot {
        version: version_epoch,
        built_at,
        leaf_count: sorted_leaves.len(),
        sorted_leaves,
        merkle_levels,
        root,
        manifest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AuthorityLevel, BoundaryType, Geometry, Point, Provenance, SourceKind};
    use chrono::DateTime;

    fn boundary(id: &str, fips: &str, kind: BoundaryType) -> Boundary {
        let exterior = vec![
            Point::new(0.0, 0.0).unwrap(),
            Point::new(1.0, 0.0).unwrap(),
            Point::new(1.0, 1.0).unwrap(),
            Point::new(0.0, 1.0).unwrap(),
            Point::new(0.0, 0.0).unwrap(),
        ];
        let geometry = Geometry::Polygon { exterior, holes: vec![] };
        let bbox = geometry.recompute_bbox().unwrap();
        Boundary {
            id: id.to_string(),
            r#type: kind,
            name: id.to_string(),
            jurisdiction: "test".to_string(),
            jurisdiction_fips: fips.to_string(),
            geometry,
            bbox,
            valid_from: DateTime::from_timestamp(0, 0).unwrap(),
            valid_until: None,
            provenance: Provenance {
                source_kind: SourceKind::StateGis,
                source_url: "https://gis.example.gov".to_string(),
                retrieved_at: DateTime::from_timestamp(0, 0).unwrap(),
                data_version: None,
                license: None,
                processing_steps: vec![],
                authority_level: AuthorityLevel::StateGis,
                last_verified: DateTime::from_timestamp(0, 0).unwrap(),
            },
            raw_attributes: Default::default(),
        }
    }

    #[test]
    fn build_is_byte_identical_across_two_runs() {
        let mut map = BTreeMap::new();
        map.insert(
            ("06".to_string(), "congressional".to_string()),
            vec![boundary("0601", "06", BoundaryType::CongressionalDistrict), boundary("0602", "06", BoundaryType::CongressionalDistrict)],
        );
        let registry = ExpectedCountRegistry::new();
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();

        let a = build_snapshot(&map, 1, &registry, vec![], now).unwrap();
        let b = build_snapshot(&map, 1, &registry, vec![], now).unwrap();
        assert_eq!(a.root, b.root);
        assert_eq!(a.sorted_leaves, b.sorted_leaves);
    }

    #[test]
    fn verify_integrity_passes_for_a_fresh_build() {
        let mut map = BTreeMap::new();
        map.insert(("06".to_string(), "congressional".to_string()), vec![boundary("0601", "06", BoundaryType::CongressionalDistrict)]);
        let registry = ExpectedCountRegistry::new();
        let now = DateTime::from_timestamp(0, 0).unwrap();
        let snapshot = build_snapshot(&map, 1, &registry, vec![], now).unwrap();
        assert!(snapshot.verify_integrity().is_ok());
    }

    #[test]
    fn tampered_root_fails_integrity() {
        let mut map = BTreeMap::new();
        map.insert(("06".to_string(), "congressional".to_string()), vec![boundary("0601", "06", BoundaryType::CongressionalDistrict)]);
        let registry = ExpectedCountRegistry::new();
        let now = DateTime::from_timestamp(0, 0).unwrap();
        let mut snapshot = build_snapshot(&map, 1, &registry, vec![], now).unwrap();
        snapshot.root[0] ^= 0xff;
        assert!(snapshot.verify_integrity().is_err());
    }

    #[test]
    fn registry_mismatch_is_recorded_in_manifest() {
        let mut map = BTreeMap::new();
        map.insert(
            ("06".to_string(), "congressional".to_string()),
            vec![boundary("0601", "06", BoundaryType::CongressionalDistrict)],
        );
        let mut registry = ExpectedCountRegistry::new();
        registry.insert(("06".to_string(), "congressional".to_string()), 52);
        let now = DateTime::from_timestamp(0, 0).unwrap();
        let snapshot = build_snapshot(&map, 1, &registry, vec![], now).unwrap();
        assert_eq!(snapshot.manifest.count_discrepancies.len(), 1);
        assert_eq!(snapshot.manifest.count_discrepancies[0].expected, 52);
    }
}

//! C12: the Atlas builder. Encodes validated boundaries into leaves,
//! orders them canonically, folds a Poseidon Merkle tree bottom-up, and
//! assembles the published [`AtlasSnapshot`] (§4.12).
//!
//! Single-threaded by design (§5): determinism trumps throughput. Two
//! builds from the same inputs and pinned constants must be byte-identical
//! (tested by rebuilding every snapshot twice, see `builder::tests`).

pub mod builder;
pub mod leaf;
pub mod manifest;
pub mod merkle;

pub use builder::build_snapshot;
pub use leaf::{encode_leaf, LeafInput};
pub use manifest::{AtlasManifest, AuthoritySummary};
pub use merkle::{fold_tree, MerkleTree, ZERO_LEAF_HEX};

use serde::{Deserialize, Serialize};

use crate::hash::FieldElement;

/// Schema version for [`AtlasSnapshot`] serialization.
pub const SNAPSHOT_SCHEMA_VERSION: &str = "1.0.0";

/// An immutable, content-addressed Atlas version (§3). Built offline;
/// published to content-addressed storage; referenced by a manifest CID
/// registered on-chain. A prior snapshot remains queryable for the grace
/// period configured on the on-chain gate (C14).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasSnapshot {
    /// Monotonic version epoch baked into every leaf's encoding.
    pub version: u64,
    /// Build timestamp.
    pub built_at: chrono::DateTime<chrono::Utc>,
    /// `sorted_leaves.len()`.
    pub leaf_count: usize,
    /// Leaves, sorted by `(boundary_type_ordinal asc, jurisdiction_fips asc,
    /// geoid asc)` (§3).
    pub sorted_leaves: Vec<[u8; 32]>,
    /// Every tree level, leaves first, root last.
    pub merkle_levels: Vec<Vec<[u8; 32]>>,
    /// The Merkle root, i.e. `merkle_levels.last().unwrap()[0]`.
    pub root: [u8; 32],
    /// Expected counts, discrepancies, and integrity digest.
    pub manifest: AtlasManifest,
}

impl AtlasSnapshot {
    /// Recompute the root from `sorted_leaves` and compare against the
    /// stored `root` (testable property #3, `SnapshotIntegrityFailure`).
    pub fn verify_integrity(&self) -> Result<(), crate::errors::ShadowAtlasError> {
        let recomputed = fold_tree(&self.sorted_leaves)?;
        if recomputed.root() == self.root && self.leaf_count == self.sorted_leaves.len() {
            Ok(())
        } else {
            Err(crate::errors::ShadowAtlasError::SnapshotIntegrityFailure)
        }
    }

    /// The leaf index of a given field element, if present. Resolution
    /// relies on linear scan here; production serving (C13) indexes this
    /// by boundary id instead (see `crate::proof::lookup`).
    pub fn index_of(&self, leaf: FieldElement) -> Option<usize> {
        self.sorted_leaves.iter().position(|l| *l == leaf.0)
    }

    /// Filename a snapshot of this version is published under inside
    /// `SNAPSHOTS_DIR` (§6).
    pub fn filename_for_version(version: u64) -> String {
        format!("atlas-{version}.json")
    }

    /// Persist this snapshot atomically: write to a sibling `.tmp` file,
    /// then rename over the final path, the same pattern the orchestrator
    /// uses for job state (`orchestrator::job_store`).
    pub fn save_to_dir(&self, dir: &std::path::Path) -> std::io::Result<()> {
        std::fs::create_dir_all(dir)?;
        let final_path = dir.join(Self::filename_for_version(self.version));
        let tmp_path = final_path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(self)?;
        std::fs::write(&tmp_path, body)?;
        std::fs::rename(&tmp_path, &final_path)?;
        Ok(())
    }

    /// Load the highest-numbered published snapshot from `dir`, or `None`
    /// if the directory holds none.
    pub fn load_latest_from_dir(dir: &std::path::Path) -> std::io::Result<Option<Self>> {
        if !dir.exists() {
            return Ok(None);
        }
        let mut best: Option<(u64, std::path::PathBuf)> = None;
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else { continue };
            let Some(version_str) = stem.strip_prefix("atlas-") else { continue };
            let Ok(version) = version_str.parse::<u64>() else { continue };
            if best.as_ref().map_or(true, |(v, _)| version > *v) {
                best = Some((version, path));
            }
        }
        let Some((_, path)) = best else { return Ok(None) };
        let body = std::fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&body)?))
    }
}

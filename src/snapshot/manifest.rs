//! [`AtlasManifest`] (§3, §4.12 step 5, §6): expected counts, actual
//! counts, discrepancies, authority summary, and the hash-constants
//! integrity digest bundled alongside a snapshot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::AuthorityLevel;
use crate::validation::{CountMismatch, CrossSourceDiscrepancy};

/// Count of boundaries contributed by each authority level, for quick
/// provenance auditing of a snapshot.
pub type AuthoritySummary = BTreeMap<AuthorityLevel, usize>;

/// The manifest bundled with every [`super::AtlasSnapshot`] (§3, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasManifest {
    /// Expected counts per `(state, layer)`, from the pinned registry.
    pub expected_counts: BTreeMap<String, BTreeMap<String, u64>>,
    /// Actual counts per `(state, layer)` included in this snapshot.
    pub actual_counts: BTreeMap<String, BTreeMap<String, u64>>,
    /// Registry count mismatches surfaced by C6 during the build.
    pub count_discrepancies: Vec<CountMismatch>,
    /// Cross-source discrepancies surfaced by C6 during the build.
    pub cross_source_discrepancies: Vec<CrossSourceDiscrepancy>,
    /// Boundary counts by contributing authority.
    pub authority_summary: AuthoritySummary,
    /// `hash::constants::PINNED_CONSTANT_TABLE_DIGEST_HEX`, pinned at build
    /// time so a snapshot carries proof of which constant table produced it.
    pub hash_constants_digest: String,
    /// Ordered processing steps applied during the build (mirrors
    /// `Provenance::processing_steps` but at the snapshot level).
    pub processing_steps: Vec<String>,
    /// Build timestamp (duplicated from [`super::AtlasSnapshot::built_at`]
    /// so the manifest alone is a complete audit record).
    pub built_at: chrono::DateTime<chrono::Utc>,
}

impl AtlasManifest {
    /// Insert an actual count for `(state, layer)`, used while assembling
    /// the manifest during a build.
    pub fn record_actual_count(&mut self, state: &str, layer: &str, count: u64) {
        *self
            .actual_counts
            .entry(state.to_string())
            .or_default()
            .entry(layer.to_string())
            .or_insert(0) += count;
    }
}

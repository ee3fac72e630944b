//! Cross-source reconciliation (§4.6): compare a candidate extraction's
//! counts and GEOID set against a federal-authority (TIGERweb) baseline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Discrepancies between a candidate source and the federal baseline for
/// one `(state, layer)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossSourceDiscrepancy {
    /// State FIPS or postal code.
    pub state: String,
    /// Boundary layer name.
    pub layer: String,
    /// GEOIDs present in the baseline but absent from the candidate.
    pub missing: Vec<String>,
    /// GEOIDs present in the candidate but absent from the baseline.
    pub extra: Vec<String>,
}

impl CrossSourceDiscrepancy {
    /// Whether there's anything to report.
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

/// Compare `candidate_geoids` against `baseline_geoids` (TIGERweb, per
/// §4.4's authority ordering) for `(state, layer)`.
pub fn reconcile(
    state: &str,
    layer: &str,
    baseline_geoids: &[String],
    candidate_geoids: &[String],
) -> CrossSourceDiscrepancy {
    let baseline: BTreeSet<&String> = baseline_geoids.iter().collect();
    let candidate: BTreeSet<&String> = candidate_geoids.iter().collect();

    CrossSourceDiscrepancy {
        state: state.to_string(),
        layer: layer.to_string(),
        missing: baseline.difference(&candidate).map(|s| (*s).clone()).collect(),
        extra: candidate.difference(&baseline).map(|s| (*s).clone()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_sets_have_no_discrepancy() {
        let geoids = vec!["0601".to_string(), "0602".to_string()];
        let d = reconcile("06", "congressional", &geoids, &geoids);
        assert!(d.is_empty());
    }

    #[test]
    fn missing_geoid_is_reported() {
        let baseline = vec!["0601".to_string(), "0612".to_string()];
        let candidate = vec!["0601".to_string()];
        let d = reconcile("06", "congressional", &baseline, &candidate);
        assert_eq!(d.missing, vec!["0612".to_string()]);
        assert!(d.extra.is_empty());
    }

    #[test]
    fn extra_geoid_is_reported() {
        let baseline = vec!["0601".to_string()];
        let candidate = vec!["0601".to_string(), "0699".to_string()];
        let d = reconcile("06", "congressional", &baseline, &candidate);
        assert_eq!(d.extra, vec!["0699".to_string()]);
    }
}

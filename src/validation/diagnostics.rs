//! Diagnostic classifier (§4.6): when counts disagree, guess why.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

/// Suspected cause of a count disagreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchCause {
    /// A ZZ water/uninhabited district, identified by suffix or name.
    ZzWaterOrUninhabited,
    /// Duplicate district number with a letter suffix (multi-member seat).
    MultiMemberSeat,
    /// Redistricting appears to be in progress.
    RedistrictingInProgress,
    /// Data looks stale relative to the current cycle.
    StaleData,
    /// Some other data-quality defect.
    DataQualityIssue,
    /// Cause could not be determined.
    Unknown,
}

fn is_zz_suffix(geoid: &str, name: Option<&str>) -> bool {
    geoid.ends_with("ZZ") || geoid.ends_with("zz") || name.map_or(false, |n| {
        let lower = n.to_lowercase();
        lower.contains("water") || lower.contains("uninhabited") || lower.contains("unorganized")
    })
}

fn is_multi_member(missing: &[String], extra: &[String]) -> bool {
    let suffix_re = Regex::new(r"^(\d+)[A-Za-z]$").unwrap();
    let base_numbers = |geoids: &[String]| -> std::collections::BTreeSet<String> {
        geoids
            .iter()
            .filter_map(|g| suffix_re.captures(g).map(|c| c[1].to_string()))
            .collect()
    };
    let missing_bases = base_numbers(missing);
    let extra_bases = base_numbers(extra);
    !missing_bases.is_disjoint(&extra_bases)
}

/// Classify the likely cause of a count mismatch given the missing/extra
/// GEOID sets and optional boundary names for the missing set.
pub fn classify_mismatch(
    missing: &[String],
    extra: &[String],
    missing_names: &[Option<String>],
    days_since_last_verified: Option<i64>,
) -> MismatchCause {
    if missing
        .iter()
        .zip(missing_names.iter())
        .any(|(g, n)| is_zz_suffix(g, n.as_deref()))
    {
        return MismatchCause::ZzWaterOrUninhabited;
    }
    if is_multi_member(missing, extra) {
        return MismatchCause::MultiMemberSeat;
    }
    if !missing.is_empty() && !extra.is_empty() {
        return MismatchCause::RedistrictingInProgress;
    }
    if let Some(days) = days_since_last_verified {
        if days > 365 {
            return MismatchCause::StaleData;
        }
    }
    if !missing.is_empty() || !extra.is_empty() {
        return MismatchCause::DataQualityIssue;
    }
    MismatchCause::Unknown
}

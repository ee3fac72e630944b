//! Registry count check (§4.6): expected feature count per `(state, layer)`,
//! read from a pinned registry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Severity of a count mismatch, scaled by `|actual - expected|` (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Difference of exactly 1.
    Info,
    /// Difference of exactly 2.
    Warning,
    /// Difference of 3 or more.
    Critical,
}

impl Severity {
    fn from_delta(delta: u64) -> Self {
        match delta {
            0 => Self::Info,
            1 => Self::Info,
            2 => Self::Warning,
            _ => Self::Critical,
        }
    }
}

/// A registry count mismatch for one `(state, layer)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountMismatch {
    /// State FIPS or postal code.
    pub state: String,
    /// Boundary layer name.
    pub layer: String,
    /// Count the registry expects.
    pub expected: u64,
    /// Count actually extracted.
    pub actual: u64,
    /// Severity derived from the magnitude of the difference.
    pub severity: Severity,
}

/// The pinned per-`(state, layer)` expected-count registry.
pub type ExpectedCountRegistry = BTreeMap<(String, String), u64>;

/// Compare `actual` against the registry's expected count for
/// `(state, layer)`. `None` if the pair isn't registered (not a mismatch —
/// C8's `not_configured_tasks` is the place that's tracked).
pub fn check_count(registry: &ExpectedCountRegistry, state: &str, layer: &str, actual: u64) -> Option<CountMismatch> {
    let expected = *registry.get(&(state.to_string(), layer.to_string()))?;
    if expected == actual {
        return None;
    }
    let delta = expected.abs_diff(actual);
    Some(CountMismatch {
        state: state.to_string(),
        layer: layer.to_string(),
        expected,
        actual,
        severity: Severity::from_delta(delta),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ExpectedCountRegistry {
        BTreeMap::from([(("06".to_string(), "congressional".to_string()), 52u64)])
    }

    #[test]
    fn matching_count_is_not_a_mismatch() {
        assert!(check_count(&registry(), "06", "congressional", 52).is_none());
    }

    #[test]
    fn off_by_one_is_info() {
        let m = check_count(&registry(), "06", "congressional", 51).unwrap();
        assert_eq!(m.severity, Severity::Info);
    }

    #[test]
    fn off_by_two_is_warning() {
        let m = check_count(&registry(), "06", "congressional", 50).unwrap();
        assert_eq!(m.severity, Severity::Warning);
    }

    #[test]
    fn off_by_three_or_more_is_critical() {
        let m = check_count(&registry(), "06", "congressional", 48).unwrap();
        assert_eq!(m.severity, Severity::Critical);
    }

    #[test]
    fn unregistered_pair_is_not_checked() {
        assert!(check_count(&registry(), "99", "congressional", 1).is_none());
    }
}

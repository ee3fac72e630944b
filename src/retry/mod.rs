//! C11: retry orchestrator and coverage analyzer. Reads provenance (C10),
//! plans retries by blocker class (§4.11), and computes coverage gaps.

pub mod coverage;

pub use coverage::{analyze_coverage, CoverageReport};

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::types::ProvenanceEntry;

/// How long to wait before retrying a jurisdiction blocked by a given code
/// (§4.11). `Never` jurisdictions are excluded from retry candidacy
/// entirely, regardless of age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryInterval {
    Hourly,
    Daily,
    Weekly,
    Quarterly,
    Never,
}

impl RetryInterval {
    /// The concrete wait duration, or `None` for `Never`.
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Self::Hourly => Some(Duration::from_secs(60 * 60)),
            Self::Daily => Some(Duration::from_secs(24 * 60 * 60)),
            Self::Weekly => Some(Duration::from_secs(7 * 24 * 60 * 60)),
            Self::Quarterly => Some(Duration::from_secs(90 * 24 * 60 * 60)),
            Self::Never => None,
        }
    }
}

/// The blocker-code policy table (§4.11).
pub fn retry_interval_for(blocker_code: &str) -> RetryInterval {
    match blocker_code {
        "rate-limit" | "timeout" | "network-error" => RetryInterval::Hourly,
        "portal-404" | "portal-timeout" => RetryInterval::Daily,
        "portal-auth-required" | "ambiguous-layer-name" | "malformed-geojson" => RetryInterval::Weekly,
        "no-council-layer" | "no-municipal-gis" | "redistricting-in-progress" => RetryInterval::Quarterly,
        "at-large-governance" | "multi-county-unsupported" | "consolidated-city-county" => RetryInterval::Never,
        _ => RetryInterval::Daily,
    }
}

/// The latest attempt per FIPS, eligible for retry right now.
#[derive(Debug, Clone)]
pub struct RetryCandidate {
    pub fips: String,
    pub blocker_code: String,
    pub population: u64,
    pub last_attempt: DateTime<Utc>,
}

/// Group `entries` by FIPS, keep the latest attempt per jurisdiction, and
/// return those whose blocker is still set and due for retry at `now`,
/// sorted descending by population so discovery budget targets the
/// highest-impact jurisdictions first (§4.11).
pub fn select_retry_candidates(entries: &[ProvenanceEntry], now: DateTime<Utc>) -> Vec<RetryCandidate> {
    let mut latest_by_fips: BTreeMap<&str, &ProvenanceEntry> = BTreeMap::new();
    for entry in entries {
        latest_by_fips
            .entry(entry.fips.as_str())
            .and_modify(|existing| {
                if entry.timestamp > existing.timestamp {
                    *existing = entry;
                }
            })
            .or_insert(entry);
    }

    let mut candidates: Vec<RetryCandidate> = latest_by_fips
        .into_values()
        .filter_map(|entry| {
            let blocker_code = entry.blocker_code.as_ref()?;
            let interval = retry_interval_for(blocker_code);
            let wait = interval.duration()?;
            let due_at = entry.timestamp + chrono::Duration::from_std(wait).ok()?;
            if due_at > now {
                return None;
            }
            Some(RetryCandidate {
                fips: entry.fips.clone(),
                blocker_code: blocker_code.clone(),
                population: entry.population.unwrap_or(0),
                last_attempt: entry.timestamp,
            })
        })
        .collect();

    candidates.sort_by(|a, b| b.population.cmp(&a.population));
    candidates
}

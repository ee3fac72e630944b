//! Coverage analyzer (§4.11): cross-references the pinned portal registry
//! and the provenance-derived latest-attempt map against an input city
//! list to compute coverage gaps.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::types::ProvenanceEntry;

/// One jurisdiction the analyzer is asked to account for.
#[derive(Debug, Clone)]
pub struct CityRef {
    pub fips: String,
    pub state: String,
    pub population: u64,
    pub granularity_tier: u8,
}

/// A jurisdiction with no successful discovery on record, ranked for
/// prioritization by population.
#[derive(Debug, Clone)]
pub struct CoverageGap {
    pub fips: String,
    pub state: String,
    pub population: u64,
    pub blocker_code: Option<String>,
}

/// Coverage summary (§4.11).
#[derive(Debug, Clone)]
pub struct CoverageReport {
    pub total: usize,
    pub covered: usize,
    pub coverage_percent: f64,
    pub by_tier: BTreeMap<u8, usize>,
    pub by_state: BTreeMap<String, usize>,
    pub top_gaps: Vec<CoverageGap>,
}

fn latest_attempt_per_fips(entries: &[ProvenanceEntry]) -> BTreeMap<&str, &ProvenanceEntry> {
    let mut latest: BTreeMap<&str, &ProvenanceEntry> = BTreeMap::new();
    for entry in entries {
        latest
            .entry(entry.fips.as_str())
            .and_modify(|existing| {
                if entry.timestamp > existing.timestamp {
                    *existing = entry;
                }
            })
            .or_insert(entry);
    }
    latest
}

/// A city counts as covered when its latest provenance attempt succeeded
/// (no `blocker_code` set) and reported at least one feature.
fn is_covered(entry: Option<&&ProvenanceEntry>) -> bool {
    matches!(entry, Some(e) if e.blocker_code.is_none() && e.feature_count.unwrap_or(0) > 0)
}

/// Cross-reference `cities` against `entries`, producing a coverage
/// summary with the top `gap_limit` highest-population uncovered
/// jurisdictions (§4.11).
pub fn analyze_coverage(cities: &[CityRef], entries: &[ProvenanceEntry], gap_limit: usize) -> CoverageReport {
    let latest = latest_attempt_per_fips(entries);

    let mut covered = 0usize;
    let mut by_tier: BTreeMap<u8, usize> = BTreeMap::new();
    let mut by_state: BTreeMap<String, usize> = BTreeMap::new();
    let mut gaps = Vec::new();

    for city in cities {
        let attempt = latest.get(city.fips.as_str());
        if is_covered(attempt) {
            covered += 1;
            *by_tier.entry(city.granularity_tier).or_insert(0) += 1;
            *by_state.entry(city.state.clone()).or_insert(0) += 1;
        } else {
            gaps.push(CoverageGap {
                fips: city.fips.clone(),
                state: city.state.clone(),
                population: city.population,
                blocker_code: attempt.and_then(|e| e.blocker_code.clone()),
            });
        }
    }

    gaps.sort_by(|a, b| b.population.cmp(&a.population));
    gaps.truncate(gap_limit);

    let total = cities.len();
    let coverage_percent = if total == 0 { 0.0 } else { covered as f64 / total as f64 * 100.0 };

    CoverageReport {
        total,
        covered,
        coverage_percent,
        by_tier,
        by_state,
        top_gaps: gaps,
    }
}

/// Jurisdictions whose latest attempt is older than `max_age_days`, for
/// staleness audits (§4.11).
pub fn stale_data(entries: &[ProvenanceEntry], now: DateTime<Utc>, max_age_days: i64) -> Vec<String> {
    let latest = latest_attempt_per_fips(entries);
    let max_age = chrono::Duration::days(max_age_days);
    latest
        .into_iter()
        .filter(|(_, entry)| now - entry.timestamp > max_age)
        .map(|(fips, _)| fips.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QualitySignals;

    fn entry(fips: &str, blocker: Option<&str>, feature_count: Option<u64>, timestamp: DateTime<Utc>) -> ProvenanceEntry {
        ProvenanceEntry {
            fips: fips.to_string(),
            name: None,
            state: None,
            population: None,
            granularity_tier: 1,
            feature_count,
            confidence: 80,
            authority: 2,
            source_kind: None,
            url: None,
            quality: QualitySignals {
                valid: true,
                tests_passed: true,
                response_ms: 100,
                data_date: None,
            },
            reasoning_chain: vec!["probed".to_string()],
            tried_tiers: vec![1],
            blocker_code: blocker.map(|s| s.to_string()),
            timestamp,
            agent_id: "agent-1".to_string(),
            supplemental: None,
        }
    }

    fn city(fips: &str, state: &str, population: u64) -> CityRef {
        CityRef {
            fips: fips.to_string(),
            state: state.to_string(),
            population,
            granularity_tier: 1,
        }
    }

    #[test]
    fn covered_cities_count_toward_coverage_percent() {
        let t = DateTime::from_timestamp(0, 0).unwrap();
        let cities = vec![city("0644000", "CA", 100_000), city("0655000", "CA", 50_000)];
        let entries = vec![entry("0644000", None, Some(9), t)];
        let report = analyze_coverage(&cities, &entries, 10);
        assert_eq!(report.covered, 1);
        assert_eq!(report.total, 2);
        assert_eq!(report.coverage_percent, 50.0);
    }

    #[test]
    fn uncovered_cities_rank_gaps_by_population() {
        let t = DateTime::from_timestamp(0, 0).unwrap();
        let cities = vec![city("0644000", "CA", 10_000), city("0655000", "CA", 500_000)];
        let entries = vec![];
        let report = analyze_coverage(&cities, &entries, 10);
        assert_eq!(report.top_gaps[0].fips, "0655000");
    }

    #[test]
    fn blocked_attempt_with_zero_features_is_not_covered() {
        let t = DateTime::from_timestamp(0, 0).unwrap();
        let cities = vec![city("0644000", "CA", 10_000)];
        let entries = vec![entry("0644000", Some("no-council-layer"), Some(0), t)];
        let report = analyze_coverage(&cities, &entries, 10);
        assert_eq!(report.covered, 0);
        assert_eq!(report.top_gaps[0].blocker_code.as_deref(), Some("no-council-layer"));
    }

    #[test]
    fn stale_data_flags_old_attempts_only() {
        let now = DateTime::from_timestamp(10_000_000, 0).unwrap();
        let fresh = now - chrono::Duration::days(1);
        let old = now - chrono::Duration::days(200);
        let entries = vec![entry("0644000", None, Some(9), fresh), entry("0655000", None, Some(9), old)];
        let stale = stale_data(&entries, now, 90);
        assert_eq!(stale, vec!["0655000".to_string()]);
    }
}

//! Coverage/validation report export for a completed job (§4.8 "Report
//! export"): per-`(state, layer)` rows classified as `match | mismatch |
//! error | not_configured`, plus summary statistics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::JobState;
use crate::validation::registry::{check_count, ExpectedCountRegistry};

/// Classification of one `(state, layer)` row in a job report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    /// Extracted and the feature count matches the pinned registry.
    Match,
    /// Extracted but the feature count disagrees with the pinned registry.
    Mismatch,
    /// Extraction failed after exhausting retries.
    Error,
    /// No provider configured for this pair.
    NotConfigured,
}

/// One row of a [`JobReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReportRow {
    /// State FIPS or postal code.
    pub state: String,
    /// Boundary layer name.
    pub layer: String,
    /// Row classification.
    pub status: RowStatus,
    /// Feature count extracted, if the task ran.
    pub feature_count: Option<u64>,
    /// Registry-expected count, if registered.
    pub expected_count: Option<u64>,
    /// Error detail, for `error` rows.
    pub error: Option<String>,
}

/// A completed (or in-progress) job's coverage report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    /// Job this report summarizes.
    pub job_id: String,
    /// Per-`(state, layer)` rows.
    pub rows: Vec<JobReportRow>,
    /// Total configured (i.e. not `not_configured`) tasks.
    pub configurable_tasks: usize,
    /// Tasks classified `match`.
    pub matched: usize,
    /// `matched / configurable_tasks`, `0.0` if there were none.
    pub coverage_percent: f64,
}

/// Build a [`JobReport`] from a job's persisted state, the per-task feature
/// counts observed during extraction, and the pinned expected-count registry.
pub fn build_report(job: &JobState, feature_counts: &BTreeMap<(String, String), u64>, registry: &ExpectedCountRegistry) -> JobReport {
    let mut rows = Vec::new();

    for (state, layer) in &job.completed_extractions {
        let actual = feature_counts.get(&(state.clone(), layer.clone())).copied();
        let mismatch = actual.and_then(|a| check_count(registry, state, layer, a));
        let expected = registry.get(&(state.clone(), layer.clone())).copied();
        rows.push(JobReportRow {
            state: state.clone(),
            layer: layer.clone(),
            status: if mismatch.is_some() { RowStatus::Mismatch } else { RowStatus::Match },
            feature_count: actual,
            expected_count: expected,
            error: None,
        });
    }

    for failure in &job.failures {
        rows.push(JobReportRow {
            state: failure.state.clone(),
            layer: failure.layer.clone(),
            status: RowStatus::Error,
            feature_count: None,
            expected_count: registry.get(&(failure.state.clone(), failure.layer.clone())).copied(),
            error: Some(failure.error.clone()),
        });
    }

    for (state, layer, reason) in &job.not_configured_tasks {
        rows.push(JobReportRow {
            state: state.clone(),
            layer: layer.clone(),
            status: RowStatus::NotConfigured,
            feature_count: None,
            expected_count: None,
            error: Some(reason.clone()),
        });
    }

    let configurable_tasks = rows.iter().filter(|r| r.status != RowStatus::NotConfigured).count();
    let matched = rows.iter().filter(|r| r.status == RowStatus::Match).count();
    let coverage_percent = if configurable_tasks == 0 {
        0.0
    } else {
        matched as f64 / configurable_tasks as f64 * 100.0
    };

    JobReport {
        job_id: job.job_id.clone(),
        rows,
        configurable_tasks,
        matched,
        coverage_percent,
    }
}

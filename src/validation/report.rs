//! The typed validation report emitted per run (§4.6), persisted by
//! `job_id` (C8) and serializable to JSON, Markdown, or CSV.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cross_source::CrossSourceDiscrepancy;
use super::diagnostics::MismatchCause;
use super::registry::CountMismatch;
use crate::errors::InvalidGeometry;

/// One geometry defect tied to the boundary it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryFinding {
    /// The offending boundary's id.
    pub boundary_id: String,
    /// The defect itself.
    pub issue: InvalidGeometry,
}

/// A mismatch plus its classified likely cause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedMismatch {
    /// The underlying discrepancy.
    pub discrepancy: CrossSourceDiscrepancy,
    /// Its classified cause.
    pub cause: MismatchCause,
}

/// The full, typed validation report for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Job this report is associated with (C8).
    pub job_id: String,
    /// Registry count mismatches found.
    pub registry_mismatches: Vec<CountMismatch>,
    /// Cross-source discrepancies found.
    pub cross_source_discrepancies: Vec<CrossSourceDiscrepancy>,
    /// Geometry defects found.
    pub geometry_findings: Vec<GeometryFinding>,
    /// Cross-source discrepancies with classified causes.
    pub classified_mismatches: Vec<ClassifiedMismatch>,
    /// Whether the run passed overall (no critical findings).
    pub passed: bool,
    /// Overall confidence, `[0, 1]`.
    pub confidence: f64,
    /// Run start time.
    pub started_at: DateTime<Utc>,
    /// Run end time.
    pub finished_at: DateTime<Utc>,
}

impl ValidationReport {
    /// Build a report from its component findings, deriving `passed` and
    /// `confidence`.
    pub fn new(
        job_id: String,
        registry_mismatches: Vec<CountMismatch>,
        cross_source_discrepancies: Vec<CrossSourceDiscrepancy>,
        geometry_findings: Vec<GeometryFinding>,
        classified_mismatches: Vec<ClassifiedMismatch>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        let critical_registry = registry_mismatches
            .iter()
            .filter(|m| m.severity == super::registry::Severity::Critical)
            .count();
        let passed = critical_registry == 0 && geometry_findings.is_empty();

        let total_checks =
            (registry_mismatches.len() + cross_source_discrepancies.len() + geometry_findings.len()).max(1);
        let clean_checks = total_checks
            - registry_mismatches.len().min(total_checks)
            - cross_source_discrepancies.iter().filter(|d| !d.is_empty()).count()
            - geometry_findings.len();
        let confidence = (clean_checks as f64 / total_checks as f64).clamp(0.0, 1.0);

        Self {
            job_id,
            registry_mismatches,
            cross_source_discrepancies,
            geometry_findings,
            classified_mismatches,
            passed,
            confidence,
            started_at,
            finished_at,
        }
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Render a human-readable Markdown summary.
    pub fn to_markdown(&self) -> String {
        let mut out = format!(
            "# Validation report for job {}\n\n- passed: {}\n- confidence: {:.2}\n\n",
            self.job_id, self.passed, self.confidence
        );
        out.push_str("## Registry mismatches\n\n");
        for m in &self.registry_mismatches {
            out.push_str(&format!(
                "- {}/{}: expected {}, actual {} ({:?})\n",
                m.state, m.layer, m.expected, m.actual, m.severity
            ));
        }
        out.push_str("\n## Geometry findings\n\n");
        for g in &self.geometry_findings {
            out.push_str(&format!("- {}: {}\n", g.boundary_id, g.issue));
        }
        out
    }

    /// Render the registry mismatches as CSV (`state,layer,expected,actual,severity`).
    pub fn to_csv(&self) -> String {
        let mut out = String::from("state,layer,expected,actual,severity\n");
        for m in &self.registry_mismatches {
            out.push_str(&format!(
                "{},{},{},{},{:?}\n",
                m.state, m.layer, m.expected, m.actual, m.severity
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::registry::Severity;

    fn mismatch(severity: Severity) -> CountMismatch {
        CountMismatch {
            state: "06".to_string(),
            layer: "congressional".to_string(),
            expected: 52,
            actual: 51,
            severity,
        }
    }

    #[test]
    fn critical_registry_mismatch_fails_the_run() {
        let report = ValidationReport::new(
            "job-1".to_string(),
            vec![mismatch(Severity::Critical)],
            vec![],
            vec![],
            vec![],
            DateTime::from_timestamp(0, 0).unwrap(),
            DateTime::from_timestamp(1, 0).unwrap(),
        );
        assert!(!report.passed);
    }

    #[test]
    fn clean_run_passes_with_full_confidence() {
        let report = ValidationReport::new(
            "job-1".to_string(),
            vec![],
            vec![],
            vec![],
            vec![],
            DateTime::from_timestamp(0, 0).unwrap(),
            DateTime::from_timestamp(1, 0).unwrap(),
        );
        assert!(report.passed);
        assert_eq!(report.confidence, 1.0);
    }

    #[test]
    fn json_round_trips() {
        let report = ValidationReport::new(
            "job-1".to_string(),
            vec![mismatch(Severity::Info)],
            vec![],
            vec![],
            vec![],
            DateTime::from_timestamp(0, 0).unwrap(),
            DateTime::from_timestamp(1, 0).unwrap(),
        );
        let json = report.to_json().unwrap();
        let parsed: ValidationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.job_id, report.job_id);
    }
}

//! [`ProvenanceEntry`]: one compact discovery-attempt record (C10, §3).
//!
//! Abbreviated field names keep serialized entries to ~150-250 bytes, per
//! §4.10. Field docs below give the full name each abbreviation stands for.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response-quality signals recorded with a discovery attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualitySignals {
    /// Whether the discovered layer passed structural validation.
    pub valid: bool,
    /// Whether scoring/field-schema tests passed.
    pub tests_passed: bool,
    /// Observed response latency, milliseconds.
    pub response_ms: u32,
    /// Upstream's own data date, if declared.
    pub data_date: Option<String>,
}

/// One append-only discovery-attempt record (`g`=granularity tier,
/// `conf`=confidence, `auth`=authority rank — kept short per §4.10).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvenanceEntry {
    /// Jurisdiction FIPS code.
    pub fips: String,
    /// Jurisdiction name, if known.
    pub name: Option<String>,
    /// State postal code, if known.
    pub state: Option<String>,
    /// Population, used to prioritize retry budget (§4.11).
    pub population: Option<u64>,
    /// Granularity tier, 0 (precinct) .. 4 (county).
    pub granularity_tier: u8,
    /// Feature count discovered, if any.
    pub feature_count: Option<u64>,
    /// Confidence, 0..100.
    pub confidence: u8,
    /// Authority rank, 0..5 (matches [`crate::types::AuthorityLevel::rank`]).
    pub authority: u8,
    /// Kind of source found, if any (free-form upstream label).
    pub source_kind: Option<String>,
    /// URL probed/found.
    pub url: Option<String>,
    /// Response-quality signals.
    pub quality: QualitySignals,
    /// Ordered chain of reasoning steps the discovery agent took.
    pub reasoning_chain: Vec<String>,
    /// Granularity tiers already attempted for this jurisdiction.
    pub tried_tiers: Vec<u8>,
    /// Blocker classification, if this attempt was blocked (§4.11 policy table).
    pub blocker_code: Option<String>,
    /// ISO-8601 UTC timestamp of this attempt.
    pub timestamp: DateTime<Utc>,
    /// Identifier of the discovery agent/worker that made this attempt.
    pub agent_id: String,
    /// Free-form supplemental notes.
    pub supplemental: Option<String>,
}

/// Structural-validation error for a malformed entry (§4.10: "Invalid
/// entries are rejected, never silently dropped").
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProvenanceEntryError {
    /// `fips` is empty.
    #[error("fips code is empty")]
    EmptyFips,
    /// `granularity_tier` outside `[0,4]`.
    #[error("granularity_tier {0} outside [0,4]")]
    GranularityOutOfRange(u8),
    /// `confidence` outside `[0,100]` — unreachable for `u8` > 100 only.
    #[error("confidence {0} outside [0,100]")]
    ConfidenceOutOfRange(u8),
    /// `authority` outside `[0,5]`.
    #[error("authority {0} outside [0,5]")]
    AuthorityOutOfRange(u8),
    /// Reasoning chain must be non-empty.
    #[error("reasoning_chain is empty")]
    EmptyReasoningChain,
    /// Tried tiers must be non-empty.
    #[error("tried_tiers is empty")]
    EmptyTriedTiers,
}

impl ProvenanceEntry {
    /// Structural validation run at write time (§4.10).
    pub fn validate(&self) -> Result<(), ProvenanceEntryError> {
        if self.fips.is_empty() {
            return Err(ProvenanceEntryError::EmptyFips);
        }
        if self.granularity_tier > 4 {
            return Err(ProvenanceEntryError::GranularityOutOfRange(self.granularity_tier));
        }
        if self.confidence > 100 {
            return Err(ProvenanceEntryError::ConfidenceOutOfRange(self.confidence));
        }
        if self.authority > 5 {
            return Err(ProvenanceEntryError::AuthorityOutOfRange(self.authority));
        }
        if self.reasoning_chain.is_empty() {
            return Err(ProvenanceEntryError::EmptyReasoningChain);
        }
        if self.tried_tiers.is_empty() {
            return Err(ProvenanceEntryError::EmptyTriedTiers);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_entry() -> ProvenanceEntry {
        ProvenanceEntry {
            fips: "0644000".to_string(),
            name: Some("Some City".to_string()),
            state: Some("CA".to_string()),
            population: Some(50_000),
            granularity_tier: 1,
            feature_count: Some(7),
            confidence: 80,
            authority: 2,
            source_kind: Some("arcgis".to_string()),
            url: Some("https://gis.example.gov".to_string()),
            quality: QualitySignals {
                valid: true,
                tests_passed: true,
                response_ms: 120,
                data_date: None,
            },
            reasoning_chain: vec!["probed arcgis/rest/services".to_string()],
            tried_tiers: vec![1],
            blocker_code: None,
            timestamp: DateTime::from_timestamp(0, 0).unwrap(),
            agent_id: "agent-1".to_string(),
            supplemental: None,
        }
    }

    #[test]
    fn valid_entry_passes() {
        assert!(valid_entry().validate().is_ok());
    }

    #[test]
    fn rejects_empty_fips() {
        let mut e = valid_entry();
        e.fips = String::new();
        assert!(matches!(e.validate(), Err(ProvenanceEntryError::EmptyFips)));
    }

    #[test]
    fn rejects_out_of_range_granularity() {
        let mut e = valid_entry();
        e.granularity_tier = 9;
        assert!(matches!(
            e.validate(),
            Err(ProvenanceEntryError::GranularityOutOfRange(9))
        ));
    }

    #[test]
    fn rejects_empty_reasoning_chain() {
        let mut e = valid_entry();
        e.reasoning_chain.clear();
        assert!(matches!(
            e.validate(),
            Err(ProvenanceEntryError::EmptyReasoningChain)
        ));
    }
}

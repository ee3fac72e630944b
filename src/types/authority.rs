//! [`AuthorityLevel`]: ordered trust ranking for conflict resolution.

use serde::{Deserialize, Serialize};

/// Trust ranking of a boundary's source. Higher wins when two sources
/// disagree about the same boundary id (C4, C6 cross-source reconciliation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AuthorityLevel {
    /// Source could not be classified.
    Unknown = 0,
    /// Community-maintained/unofficial data.
    Community = 1,
    /// Municipal GIS portal.
    Municipal = 2,
    /// State GIS authority.
    StateGis = 3,
    /// Federal TIGER/TIGERweb.
    FederalTiger = 4,
    /// Federally-mandated authoritative source.
    FederalMandate = 5,
}

impl AuthorityLevel {
    /// Numeric rank, matching the `auth` field range `[0,5]` in provenance
    /// log entries (§4.10).
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Parse the `auth` integer field used in provenance entries, clamping
    /// out-of-range values rather than panicking (entries are untrusted
    /// input from discovery agents).
    pub fn from_rank(rank: u8) -> Self {
        match rank {
            0 => Self::Unknown,
            1 => Self::Community,
            2 => Self::Municipal,
            3 => Self::StateGis,
            4 => Self::FederalTiger,
            _ => Self::FederalMandate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn federal_mandate_outranks_everything() {
        assert!(AuthorityLevel::FederalMandate > AuthorityLevel::FederalTiger);
        assert!(AuthorityLevel::FederalTiger > AuthorityLevel::StateGis);
        assert!(AuthorityLevel::Municipal > AuthorityLevel::Community);
    }

    #[test]
    fn from_rank_clamps_high_values() {
        assert_eq!(AuthorityLevel::from_rank(200), AuthorityLevel::FederalMandate);
    }
}

//! [`Provenance`]: the immutable origin record carried by every [`super::Boundary`].
//!
//! Provenance participates only in conflict resolution (C6 cross-source
//! reconciliation); it is never mutated once attached to a boundary (§4.2).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::authority::AuthorityLevel;

/// Where a boundary's geometry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    /// Federal TIGER/TIGERweb ArcGIS FeatureServer.
    TigerWeb,
    /// A state GIS portal.
    StateGis,
    /// A municipal ArcGIS/GeoServer portal.
    MunicipalGis,
    /// A cached GeoJSON file loaded from disk.
    CachedGeoJson,
    /// Held in memory for tests only.
    InMemory,
}

/// Immutable origin record attached to a [`super::Boundary`] at extraction
/// time (C7) and never mutated afterward (§4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    /// What kind of upstream this boundary came from.
    pub source_kind: SourceKind,
    /// The exact URL/endpoint fetched.
    pub source_url: String,
    /// When the data was retrieved.
    pub retrieved_at: DateTime<Utc>,
    /// Upstream's own version/edition label, if any.
    pub data_version: Option<String>,
    /// License string, if declared by the upstream.
    pub license: Option<String>,
    /// Ordered list of transformations applied (reprojection, splitting, ...).
    pub processing_steps: Vec<String>,
    /// Trust ranking used in conflict resolution.
    pub authority_level: AuthorityLevel,
    /// Last time this record's freshness was confirmed against upstream.
    pub last_verified: DateTime<Utc>,
}

impl Provenance {
    /// Higher authority wins; ties break toward the more recently verified
    /// record (§4.6 cross-source reconciliation policy).
    pub fn outranks(&self, other: &Provenance) -> bool {
        match self.authority_level.cmp(&other.authority_level) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => self.last_verified > other.last_verified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prov(authority: AuthorityLevel, verified: i64) -> Provenance {
        Provenance {
            source_kind: SourceKind::StateGis,
            source_url: "https://example.gov".to_string(),
            retrieved_at: DateTime::from_timestamp(0, 0).unwrap(),
            data_version: None,
            license: None,
            processing_steps: vec![],
            authority_level: authority,
            last_verified: DateTime::from_timestamp(verified, 0).unwrap(),
        }
    }

    #[test]
    fn higher_authority_outranks_regardless_of_freshness() {
        let federal = prov(AuthorityLevel::FederalTiger, 0);
        let municipal = prov(AuthorityLevel::Municipal, 1_000_000);
        assert!(federal.outranks(&municipal));
        assert!(!municipal.outranks(&federal));
    }

    #[test]
    fn tie_breaks_on_freshness() {
        let newer = prov(AuthorityLevel::StateGis, 100);
        let older = prov(AuthorityLevel::StateGis, 10);
        assert!(newer.outranks(&older));
        assert!(!older.outranks(&newer));
    }
}

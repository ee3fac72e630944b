//! Provenance query API (§4.10): filter by tier, state, blocker code, min
//! confidence, date range, FIPS. Scans compressed shards and staging files
//! both, per §4.10.

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::types::ProvenanceEntry;

use super::shard::read_shard;
use super::staging::read_all_staging;
use super::ProvenanceLogError;

/// Filter predicate for a provenance query. Every field is optional and
/// ANDed together; `None` means "don't filter on this dimension".
#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    pub tier: Option<u8>,
    pub state_fips_prefix: Option<String>,
    pub blocker_code: Option<String>,
    pub min_confidence: Option<u8>,
    pub date_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub fips: Option<String>,
}

impl QueryFilter {
    fn matches(&self, entry: &ProvenanceEntry) -> bool {
        if let Some(tier) = self.tier {
            if entry.granularity_tier != tier {
                return false;
            }
        }
        if let Some(prefix) = &self.state_fips_prefix {
            if !entry.fips.starts_with(prefix.as_str()) {
                return false;
            }
        }
        if let Some(code) = &self.blocker_code {
            if entry.blocker_code.as_deref() != Some(code.as_str()) {
                return false;
            }
        }
        if let Some(min_confidence) = self.min_confidence {
            if entry.confidence < min_confidence {
                return false;
            }
        }
        if let Some((start, end)) = self.date_range {
            if entry.timestamp < start || entry.timestamp > end {
                return false;
            }
        }
        if let Some(fips) = &self.fips {
            if &entry.fips != fips {
                return false;
            }
        }
        true
    }
}

fn month_dirs(root: &Path) -> std::io::Result<Vec<std::path::PathBuf>> {
    let attempts_dir = root.join("discovery-attempts");
    if !attempts_dir.exists() {
        return Ok(Vec::new());
    }
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(attempts_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}

/// Run `filter` against every entry in `root`'s shards and staging files.
/// When `filter.state_fips_prefix` names a single two-digit state, only
/// that shard file is opened per month (§4.10: "only the matching shard
/// file is opened").
pub fn query(root: &Path, filter: &QueryFilter) -> Result<Vec<ProvenanceEntry>, ProvenanceLogError> {
    let mut results = Vec::new();

    for month_dir in month_dirs(root)? {
        let shard_files: Vec<std::path::PathBuf> = match &filter.state_fips_prefix {
            Some(prefix) if prefix.len() == 2 => {
                let candidate = month_dir.join(format!("discovery-log-{prefix}.ndjson.gz"));
                if candidate.exists() {
                    vec![candidate]
                } else {
                    Vec::new()
                }
            }
            _ => std::fs::read_dir(&month_dir)?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("gz"))
                .collect(),
        };

        for shard_file in shard_files {
            for entry in read_shard(&shard_file)? {
                if filter.matches(&entry) {
                    results.push(entry);
                }
            }
        }
    }

    for entry in read_all_staging(root)? {
        if filter.matches(&entry) {
            results.push(entry);
        }
    }

    Ok(results)
}

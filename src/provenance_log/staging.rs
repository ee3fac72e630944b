//! Staging mode (§4.10): for hundreds of concurrent discovery workers, each
//! worker appends to its own uncompressed file; a separate merge step folds
//! staging files into the compressed, locked shards.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::types::ProvenanceEntry;

use super::shard::append_locked;
use super::ProvenanceLogError;

/// `discovery-attempts-staging/YYYY-MM/agent-<id>.ndjson` (§6). Grouped by
/// the entry's own month, same rule as locked-mode shards.
pub fn staging_path(root: &Path, timestamp: chrono::DateTime<chrono::Utc>, agent_id: &str) -> PathBuf {
    root.join("discovery-attempts-staging")
        .join(timestamp.format("%Y-%m").to_string())
        .join(format!("agent-{agent_id}.ndjson"))
}

/// Append one entry to this worker's private staging file. No lock needed:
/// each agent owns its file exclusively (§4.10, §5).
pub async fn append_staging(root: &Path, agent_id: &str, entry: &ProvenanceEntry) -> Result<(), ProvenanceLogError> {
    entry.validate()?;

    let path = staging_path(root, entry.timestamp, agent_id);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    let serialized = serde_json::to_string(entry).map_err(|e| ProvenanceLogError::Malformed(e.to_string()))?;
    writeln!(file, "{serialized}")?;
    Ok(())
}

/// Read every line of one staging file.
fn read_staging_file(path: &Path) -> Result<Vec<ProvenanceEntry>, ProvenanceLogError> {
    let file = fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let entry: ProvenanceEntry =
            serde_json::from_str(&line).map_err(|e| ProvenanceLogError::Malformed(e.to_string()))?;
        entries.push(entry);
    }
    Ok(entries)
}

fn staging_root(root: &Path) -> PathBuf {
    root.join("discovery-attempts-staging")
}

/// Walk every staging file under `root`, append each entry into its shard
/// via the locked path, then delete the consumed staging file. Returns the
/// number of entries merged.
pub async fn merge_staging(root: &Path) -> Result<usize, ProvenanceLogError> {
    let staging_dir = staging_root(root);
    if !staging_dir.exists() {
        return Ok(0);
    }

    let mut merged = 0usize;
    let mut staging_files = Vec::new();
    for month_entry in fs::read_dir(&staging_dir)? {
        let month_entry = month_entry?;
        if !month_entry.file_type()?.is_dir() {
            continue;
        }
        for file_entry in fs::read_dir(month_entry.path())? {
            let file_entry = file_entry?;
            if file_entry.path().extension().and_then(|e| e.to_str()) == Some("ndjson") {
                staging_files.push(file_entry.path());
            }
        }
    }

    for staging_file in staging_files {
        let entries = read_staging_file(&staging_file)?;
        for entry in &entries {
            append_locked(root, entry).await?;
        }
        merged += entries.len();
        fs::remove_file(&staging_file)?;
    }
    Ok(merged)
}

/// Every staging entry across all agents, for read paths that must scan
/// both compressed shards and staging (§4.10).
pub fn read_all_staging(root: &Path) -> Result<Vec<ProvenanceEntry>, ProvenanceLogError> {
    let staging_dir = staging_root(root);
    if !staging_dir.exists() {
        return Ok(Vec::new());
    }
    let mut entries = Vec::new();
    for month_entry in fs::read_dir(&staging_dir)? {
        let month_entry = month_entry?;
        if !month_entry.file_type()?.is_dir() {
            continue;
        }
        for file_entry in fs::read_dir(month_entry.path())? {
            let file_entry = file_entry?;
            if file_entry.path().extension().and_then(|e| e.to_str()) == Some("ndjson") {
                entries.extend(read_staging_file(&file_entry.path())?);
            }
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provenance_log::shard::{read_shard, shard_path};
    use crate::types::QualitySignals;
    use chrono::DateTime;
    use tempfile::tempdir;

    fn entry(fips: &str, timestamp: chrono::DateTime<chrono::Utc>) -> ProvenanceEntry {
        ProvenanceEntry {
            fips: fips.to_string(),
            name: None,
            state: None,
            population: Some(1000),
            granularity_tier: 1,
            feature_count: Some(5),
            confidence: 80,
            authority: 2,
            source_kind: Some("arcgis".to_string()),
            url: None,
            quality: QualitySignals {
                valid: true,
                tests_passed: true,
                response_ms: 100,
                data_date: None,
            },
            reasoning_chain: vec!["probed".to_string()],
            tried_tiers: vec![1],
            blocker_code: None,
            timestamp,
            agent_id: "agent-1".to_string(),
            supplemental: None,
        }
    }

    #[tokio::test]
    async fn staged_entries_are_visible_before_merge() {
        let dir = tempdir().unwrap();
        let ts = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        append_staging(dir.path(), "agent-1", &entry("0644000", ts)).await.unwrap();
        let all = read_all_staging(dir.path()).unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn merge_moves_staging_entries_into_locked_shards() {
        let dir = tempdir().unwrap();
        let ts = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        append_staging(dir.path(), "agent-1", &entry("0644000", ts)).await.unwrap();
        append_staging(dir.path(), "agent-2", &entry("0655000", ts)).await.unwrap();

        let merged = merge_staging(dir.path()).await.unwrap();
        assert_eq!(merged, 2);
        assert!(read_all_staging(dir.path()).unwrap().is_empty());

        let shard_file = shard_path(dir.path(), ts, "0644000");
        let entries = read_shard(&shard_file).unwrap();
        assert_eq!(entries.len(), 1);
    }
}

//! Locked-mode shard writes (§4.10): one writer at a time per state shard,
//! acquired via atomic creation of a `.lock` sibling file.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::types::ProvenanceEntry;

use super::ProvenanceLogError;

const LOCK_RETRY_ATTEMPTS: u32 = 50;
const LOCK_RETRY_DELAY_MS: u64 = 100;

/// `discovery-attempts/YYYY-MM/discovery-log-NN.ndjson.gz` (§4.10, §6).
/// `NN` is the first two digits of `fips` — the state shard. The month is
/// taken from the entry's own timestamp, never wall-clock at write time
/// (§6: "critical for out-of-order writes").
pub fn shard_path(root: &Path, timestamp: DateTime<Utc>, fips: &str) -> PathBuf {
    let state_prefix = &fips[..fips.len().min(2)];
    root.join("discovery-attempts")
        .join(timestamp.format("%Y-%m").to_string())
        .join(format!("discovery-log-{state_prefix}.ndjson.gz"))
}

struct LockGuard {
    path: PathBuf,
}

impl LockGuard {
    async fn acquire(path: PathBuf) -> Result<Self, ProvenanceLogError> {
        for _ in 0..LOCK_RETRY_ATTEMPTS {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok(Self { path }),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    tokio::time::sleep(Duration::from_millis(LOCK_RETRY_DELAY_MS)).await;
                }
                Err(e) => return Err(ProvenanceLogError::Io(e)),
            }
        }
        Err(ProvenanceLogError::LockTimeout {
            attempts: LOCK_RETRY_ATTEMPTS,
        })
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn read_existing_lines(shard_file: &Path) -> Result<Vec<String>, ProvenanceLogError> {
    if !shard_file.exists() {
        return Ok(Vec::new());
    }
    let compressed = fs::read(shard_file)?;
    let mut decoder = GzDecoder::new(&compressed[..]);
    let mut decompressed = String::new();
    decoder
        .read_to_string(&mut decompressed)
        .map_err(|e| ProvenanceLogError::Malformed(e.to_string()))?;
    Ok(decompressed.lines().map(|l| l.to_string()).collect())
}

fn write_shard_atomically(shard_file: &Path, lines: &[String]) -> Result<(), ProvenanceLogError> {
    let tmp_path = shard_file.with_extension("ndjson.gz.tmp");
    {
        let tmp_file = File::create(&tmp_path)?;
        let mut encoder = GzEncoder::new(tmp_file, Compression::default());
        for line in lines {
            encoder.write_all(line.as_bytes())?;
            encoder.write_all(b"\n")?;
        }
        encoder.finish()?;
    }
    fs::rename(&tmp_path, shard_file)?;
    Ok(())
}

/// Append one entry to its shard, holding the shard lock for the duration
/// of the read-decompress-append-recompress-release cycle (§4.10 locked
/// mode). Validates the entry before acquiring the lock.
pub async fn append_locked(root: &Path, entry: &ProvenanceEntry) -> Result<(), ProvenanceLogError> {
    entry.validate()?;

    let shard_file = shard_path(root, entry.timestamp, &entry.fips);
    if let Some(parent) = shard_file.parent() {
        fs::create_dir_all(parent)?;
    }
    let lock_path = shard_file.with_extension("ndjson.gz.lock");
    let _guard = LockGuard::acquire(lock_path).await?;

    let mut lines = read_existing_lines(&shard_file)?;
    let serialized = serde_json::to_string(entry).map_err(|e| ProvenanceLogError::Malformed(e.to_string()))?;
    lines.push(serialized);
    write_shard_atomically(&shard_file, &lines)?;
    Ok(())
}

/// Decompress and parse every entry in one shard file.
pub fn read_shard(shard_file: &Path) -> Result<Vec<ProvenanceEntry>, ProvenanceLogError> {
    read_existing_lines(shard_file)?
        .into_iter()
        .filter(|l| !l.is_empty())
        .map(|l| serde_json::from_str(&l).map_err(|e| ProvenanceLogError::Malformed(e.to_string())))
        .collect()
}

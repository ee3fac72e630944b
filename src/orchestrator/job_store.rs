//! Job state persistence: atomic temp-file + rename, no locking required
//! because a job is owned by exactly one running orchestrator (§4.8 step 4,
//! §5 "single-writer, many-reader").

use std::path::{Path, PathBuf};

use crate::types::JobState;

/// Failure persisting or loading a [`JobState`].
#[derive(Debug, thiserror::Error)]
pub enum JobStoreError {
    /// Underlying filesystem operation failed.
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
    /// Stored JSON did not deserialize to a `JobState`.
    #[error("malformed job state: {0}")]
    Malformed(#[from] serde_json::Error),
    /// No job file exists at the expected path.
    #[error("job {0} not found")]
    NotFound(String),
}

/// Filesystem-backed job state store rooted at `.shadow-atlas/jobs/`.
#[derive(Debug, Clone)]
pub struct JobStore {
    root: PathBuf,
}

impl JobStore {
    /// Root defaults to `.shadow-atlas/jobs` relative to the process cwd,
    /// matching the on-disk layout named in §6.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, job_id: &str) -> PathBuf {
        self.root.join(format!("{job_id}.json"))
    }

    /// Persist `state` atomically: write to a sibling `.tmp` file, then
    /// rename over the final path. Renames are atomic on the same filesystem,
    /// so readers never observe a partially-written file.
    pub fn save(&self, state: &JobState) -> Result<(), JobStoreError> {
        std::fs::create_dir_all(&self.root)?;
        let final_path = self.path_for(&state.job_id);
        let tmp_path = final_path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(state)?;
        std::fs::write(&tmp_path, body)?;
        std::fs::rename(&tmp_path, &final_path)?;
        Ok(())
    }

    /// Load a previously persisted job by id.
    pub fn load(&self, job_id: &str) -> Result<JobState, JobStoreError> {
        let path = self.path_for(job_id);
        if !path.exists() {
            return Err(JobStoreError::NotFound(job_id.to_string()));
        }
        let body = std::fs::read(&path)?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Root directory jobs are persisted under.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

//! [`JobState`]: the batch orchestrator's persisted state machine (C8, §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `pending -> running -> {completed | partial | failed | cancelled}`.
/// `partial` and `failed` are resumable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created but not yet started.
    Pending,
    /// Actively processing tasks.
    Running,
    /// Some tasks succeeded, some failed.
    Partial,
    /// All configured tasks completed.
    Completed,
    /// No task succeeded.
    Failed,
    /// Cancelled cooperatively; in-flight tasks ran to completion.
    Cancelled,
}

/// The `(states[], layers[])` scope of an orchestration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobScope {
    /// State FIPS codes (or postal codes) in scope.
    pub states: Vec<String>,
    /// Boundary layers in scope (e.g. "congressional", "council").
    pub layers: Vec<String>,
}

/// Tunable orchestrator behavior (§4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOptions {
    /// Bounded worker pool size. Default 5.
    pub concurrency: usize,
    /// Per-task retry count on exception. Default 3.
    pub max_retries: u32,
    /// Delay between retries, milliseconds. Default 2000.
    pub retry_delay_ms: u64,
    /// Sleep after every task to respect upstream rate limits. Default 500.
    pub rate_limit_sleep_ms: u64,
    /// Whether to keep running after a task exhausts its retries.
    pub continue_on_error: bool,
    /// Whether each extraction is validated immediately (C6) before being
    /// recorded as a completion.
    pub validate: bool,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            concurrency: 5,
            max_retries: 3,
            retry_delay_ms: 2000,
            rate_limit_sleep_ms: 500,
            continue_on_error: true,
            validate: true,
        }
    }
}

/// Running totals for a job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobProgress {
    /// Total configured tasks.
    pub total: usize,
    /// Tasks completed successfully.
    pub completed: usize,
    /// Tasks that exhausted retries.
    pub failed: usize,
    /// `(state, layer)` of the task currently in flight, if any.
    pub current_task: Option<(String, String)>,
}

/// A task that exhausted its retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskFailure {
    /// State in the failing task.
    pub state: String,
    /// Layer in the failing task.
    pub layer: String,
    /// Last error message observed.
    pub error: String,
    /// Number of attempts made.
    pub attempts: u32,
}

/// The full persisted state of one orchestration run (§3, §6).
///
/// `<job_id>` format: `job-<base36-time>-<8-hex-random>`, persisted at
/// `.shadow-atlas/jobs/<job_id>.json` via atomic temp-file + rename.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobState {
    /// Unique job identifier.
    pub job_id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last state-transition timestamp.
    pub updated_at: DateTime<Utc>,
    /// Current status.
    pub status: JobStatus,
    /// Requested scope.
    pub scope: JobScope,
    /// Running progress counters.
    pub progress: JobProgress,
    /// `(state, layer)` pairs that succeeded.
    pub completed_extractions: Vec<(String, String)>,
    /// Tasks that failed after exhausting retries.
    pub failures: Vec<TaskFailure>,
    /// `(state, layer)` pairs not present in the pinned registry, with reason.
    pub not_configured_tasks: Vec<(String, String, String)>,
    /// The options this job was (or will be, on resume) run with.
    pub options: JobOptions,
}

impl JobState {
    /// A fresh job in `pending` status with zeroed progress.
    pub fn new(job_id: String, scope: JobScope, options: JobOptions, now: DateTime<Utc>) -> Self {
        Self {
            job_id,
            created_at: now,
            updated_at: now,
            status: JobStatus::Pending,
            scope,
            progress: JobProgress::default(),
            completed_extractions: Vec::new(),
            failures: Vec::new(),
            not_configured_tasks: Vec::new(),
            options,
        }
    }

    /// Generate a `job-<base36-time>-<8-hex-random>` id without relying on
    /// wall-clock time inside pure logic (callers pass `now`/`random_hex`
    /// explicitly so this stays unit-testable and deterministic).
    pub fn format_job_id(now_millis: u128, random_hex: &str) -> String {
        format!("job-{}-{}", to_base36(now_millis), random_hex)
    }

    /// Whether `(state, layer)` already completed, so `resume` can skip it.
    pub fn is_completed(&self, state: &str, layer: &str) -> bool {
        self.completed_extractions
            .iter()
            .any(|(s, l)| s == state && l == layer)
    }

    /// Final status per §4.8 step 7. `cancelled` reflects whether the run's
    /// `CancelToken` was tripped; a cancellation that lands after every task
    /// was already claimed is indistinguishable from a normal finish and
    /// falls through to the ordinary completed/partial/failed logic below.
    pub fn finalize_status(&mut self, cancelled: bool) {
        let all_tasks_accounted_for = self.progress.completed + self.progress.failed >= self.progress.total;
        self.status = if cancelled && !all_tasks_accounted_for {
            JobStatus::Cancelled
        } else if self.progress.failed == 0 && self.progress.completed == self.progress.total {
            JobStatus::Completed
        } else if self.progress.completed > 0 {
            JobStatus::Partial
        } else {
            JobStatus::Failed
        };
    }
}

fn to_base36(mut n: u128) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> JobState {
        JobState::new(
            "job-test-00000000".to_string(),
            JobScope {
                states: vec!["06".to_string()],
                layers: vec!["congressional".to_string()],
            },
            JobOptions::default(),
            DateTime::from_timestamp(0, 0).unwrap(),
        )
    }

    #[test]
    fn finalize_completed_when_all_succeed() {
        let mut s = state();
        s.progress.total = 3;
        s.progress.completed = 3;
        s.finalize_status(false);
        assert_eq!(s.status, JobStatus::Completed);
    }

    #[test]
    fn finalize_partial_when_some_fail() {
        let mut s = state();
        s.progress.total = 9;
        s.progress.completed = 7;
        s.progress.failed = 2;
        s.finalize_status(false);
        assert_eq!(s.status, JobStatus::Partial);
    }

    #[test]
    fn finalize_failed_when_none_succeed() {
        let mut s = state();
        s.progress.total = 2;
        s.progress.completed = 0;
        s.progress.failed = 2;
        s.finalize_status(false);
        assert_eq!(s.status, JobStatus::Failed);
    }

    #[test]
    fn finalize_cancelled_when_cancel_requested_before_all_tasks_ran() {
        let mut s = state();
        s.progress.total = 5;
        s.progress.completed = 2;
        s.finalize_status(true);
        assert_eq!(s.status, JobStatus::Cancelled);
    }

    #[test]
    fn finalize_ignores_stale_cancel_once_every_task_is_accounted_for() {
        let mut s = state();
        s.progress.total = 3;
        s.progress.completed = 3;
        s.finalize_status(true);
        assert_eq!(
            s.status,
            JobStatus::Completed,
            "a cancel requested after the last task already finished must not override a clean completion"
        );
    }

    #[test]
    fn job_id_format_is_stable() {
        let id = JobState::format_job_id(0, "deadbeef");
        assert_eq!(id, "job-0-deadbeef");
    }

    #[test]
    fn base36_roundtrip_sanity() {
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(35), "z");
    }
}

//! C8: the batch orchestrator. Ties [`job_store`], [`worker_pool`], and
//! [`report`] to C7 extraction and C6 validation into the resumable,
//! concurrent multi-state/multi-layer extraction run described in §4.8.

pub mod job_store;
pub mod report;
pub mod worker_pool;

pub use job_store::{JobStore, JobStoreError};
pub use report::{build_report, JobReport, JobReportRow, RowStatus};
pub use worker_pool::{run_bounded, CancelToken, TaskCursor};

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::Rng;

use crate::extraction::ExtractionProvider;
use crate::types::{JobOptions, JobProgress, JobScope, JobState, JobStatus, TaskFailure};
use crate::validation::ExpectedCountRegistry;

/// A task transition, delivered to the caller's progress callback (§4.8
/// "Progress callback").
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub job_id: String,
    pub state: String,
    pub layer: String,
    pub status: TaskStatus,
    pub progress: JobProgress,
    pub error: Option<String>,
}

/// The three transitions a task can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Started,
    Completed,
    Failed,
}

/// Resolves an [`ExtractionProvider`] for a `(state, layer)` pair, or
/// `None` if nothing is configured for it (§4.8 step 1).
pub type ProviderResolver = Arc<dyn Fn(&str, &str) -> Option<Arc<dyn ExtractionProvider>> + Send + Sync>;

fn task_pairs(scope: &JobScope) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for state in &scope.states {
        for layer in &scope.layers {
            pairs.push((state.clone(), layer.clone()));
        }
    }
    pairs
}

/// Run one `(state, layer)` task to completion, retrying up to
/// `max_retries` times with `retry_delay_ms` between attempts (§4.8 step 3).
async fn run_task_with_retries(
    provider: Arc<dyn ExtractionProvider>,
    state: &str,
    layer: &str,
    max_retries: u32,
    retry_delay_ms: u64,
) -> Result<(u64, bool), TaskFailure> {
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        match provider.extract(state, layer).await {
            Ok(result) => return Ok((result.feature_count, result.success)),
            Err(e) => {
                if attempts > max_retries {
                    return Err(TaskFailure {
                        state: state.to_string(),
                        layer: layer.to_string(),
                        error: e.to_string(),
                        attempts,
                    });
                }
                tokio::time::sleep(std::time::Duration::from_millis(retry_delay_ms)).await;
            }
        }
    }
}

/// Shared, mutation-serializing handle to a job's in-memory state,
/// persisted after every task transition (§4.8 step 4).
struct JobHandle {
    store: JobStore,
    state: Mutex<JobState>,
}

impl JobHandle {
    fn persist(&self) -> Result<(), JobStoreError> {
        self.store.save(&self.state.lock())
    }
}

async fn execute_pairs(
    handle: Arc<JobHandle>,
    pairs: Vec<(String, String)>,
    providers: ProviderResolver,
    registry: ExpectedCountRegistry,
    options: JobOptions,
    on_progress: Arc<dyn Fn(ProgressEvent) + Send + Sync>,
    cancel: CancelToken,
) -> BTreeMap<(String, String), u64> {
    let feature_counts: Arc<Mutex<BTreeMap<(String, String), u64>>> = Arc::new(Mutex::new(BTreeMap::new()));

    run_bounded(pairs, options.concurrency, cancel, {
        let handle = Arc::clone(&handle);
        let providers = Arc::clone(&providers);
        let registry = registry.clone();
        let on_progress = Arc::clone(&on_progress);
        let feature_counts = Arc::clone(&feature_counts);
        move |_index, (state, layer)| {
            let handle = Arc::clone(&handle);
            let providers = Arc::clone(&providers);
            let registry = registry.clone();
            let on_progress = Arc::clone(&on_progress);
            let feature_counts = Arc::clone(&feature_counts);
            async move {
                {
                    let job_state = handle.state.lock();
                    on_progress(ProgressEvent {
                        job_id: job_state.job_id.clone(),
                        state: state.clone(),
                        layer: layer.clone(),
                        status: TaskStatus::Started,
                        progress: job_state.progress.clone(),
                        error: None,
                    });
                }

                let Some(provider) = providers(&state, &layer) else {
                    let mut job_state = handle.state.lock();
                    job_state
                        .not_configured_tasks
                        .push((state.clone(), layer.clone(), "no provider configured".to_string()));
                    let _ = handle.persist();
                    return;
                };

                let result = run_task_with_retries(provider, &state, &layer, options.max_retries, options.retry_delay_ms).await;

                let mut job_state = handle.state.lock();
                match result {
                    Ok((count, _success)) => {
                        job_state.completed_extractions.push((state.clone(), layer.clone()));
                        job_state.progress.completed += 1;
                        feature_counts.lock().insert((state.clone(), layer.clone()), count);
                        let _ = crate::validation::check_count(&registry, &state, &layer, count);
                        on_progress(ProgressEvent {
                            job_id: job_state.job_id.clone(),
                            state: state.clone(),
                            layer: layer.clone(),
                            status: TaskStatus::Completed,
                            progress: job_state.progress.clone(),
                            error: None,
                        });
                    }
                    Err(failure) => {
                        let error_message = failure.error.clone();
                        job_state.failures.push(failure);
                        job_state.progress.failed += 1;
                        on_progress(ProgressEvent {
                            job_id: job_state.job_id.clone(),
                            state: state.clone(),
                            layer: layer.clone(),
                            status: TaskStatus::Failed,
                            progress: job_state.progress.clone(),
                            error: Some(error_message),
                        });
                    }
                }
                let _ = handle.persist();
                drop(job_state);

                if options.rate_limit_sleep_ms > 0 {
                    tokio::time::sleep(std::time::Duration::from_millis(options.rate_limit_sleep_ms)).await;
                }
            }
        }
    })
    .await;

    Arc::try_unwrap(feature_counts).map(Mutex::into_inner).unwrap_or_default()
}

/// §4.8: create a job over `scope`, pre-validate every `(state, layer)`
/// pair against `providers`, then run the configured subset through a
/// bounded worker pool.
///
/// `cancel` is the caller's handle onto this run's cancellation flag (§4.8
/// step 6, §5): retain a clone before calling and invoke `.cancel()` from
/// another task to stop the job cooperatively. Workers check it between
/// tasks, never mid-task, so `orchestrate` can return with some tasks
/// still unclaimed; the job is then persisted as [`JobStatus::Cancelled`]
/// rather than `partial`/`failed`.
pub async fn orchestrate(
    store: JobStore,
    scope: JobScope,
    options: JobOptions,
    providers: ProviderResolver,
    registry: ExpectedCountRegistry,
    on_progress: Arc<dyn Fn(ProgressEvent) + Send + Sync>,
    cancel: CancelToken,
    now: DateTime<Utc>,
) -> Result<(JobState, BTreeMap<(String, String), u64>), JobStoreError> {
    let random_hex: String = {
        let mut rng = rand::thread_rng();
        (0..8).map(|_| std::char::from_digit(rng.gen_range(0..16), 16).unwrap()).collect()
    };
    let job_id = JobState::format_job_id(now.timestamp_millis() as u128, &random_hex);

    let pairs = task_pairs(&scope);
    let mut job = JobState::new(job_id, scope, options.clone(), now);
    job.status = JobStatus::Running;
    job.progress.total = pairs.len();
    store.save(&job)?;

    let handle = Arc::new(JobHandle {
        store: store.clone(),
        state: Mutex::new(job),
    });

    let feature_counts = execute_pairs(
        Arc::clone(&handle),
        pairs,
        providers,
        registry,
        options,
        on_progress,
        cancel.clone(),
    )
    .await;

    let mut job = handle.state.lock().clone();
    job.updated_at = now;
    job.finalize_status(cancel.is_cancelled());
    handle.store.save(&job)?;

    Ok((job, feature_counts))
}

/// §4.8 `resume(job_id)`: load state, skip already-completed `(state,
/// layer)` pairs, and run only the remainder with the job's original
/// options.
///
/// `cancel` behaves exactly as in [`orchestrate`]: a fresh handle the
/// caller keeps a clone of to cancel the resumed run from outside.
pub async fn resume(
    store: JobStore,
    job_id: &str,
    providers: ProviderResolver,
    registry: ExpectedCountRegistry,
    on_progress: Arc<dyn Fn(ProgressEvent) + Send + Sync>,
    cancel: CancelToken,
    now: DateTime<Utc>,
) -> Result<(JobState, BTreeMap<(String, String), u64>), JobStoreError> {
    let mut job = store.load(job_id)?;
    job.status = JobStatus::Running;

    let remaining: Vec<(String, String)> = task_pairs(&job.scope)
        .into_iter()
        .filter(|(s, l)| !job.is_completed(s, l))
        .collect();

    let options = job.options.clone();
    store.save(&job)?;

    let handle = Arc::new(JobHandle {
        store: store.clone(),
        state: Mutex::new(job),
    });

    let feature_counts = execute_pairs(
        Arc::clone(&handle),
        remaining,
        providers,
        registry,
        options,
        on_progress,
        cancel.clone(),
    )
    .await;

    let mut job = handle.state.lock().clone();
    job.updated_at = now;
    job.finalize_status(cancel.is_cancelled());
    handle.store.save(&job)?;

    Ok((job, feature_counts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{ExtractionError, ExtractionResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct AlwaysSucceeds {
        feature_count: u64,
    }

    #[async_trait]
    impl ExtractionProvider for AlwaysSucceeds {
        async fn extract(&self, state: &str, layer: &str) -> Result<ExtractionResult, ExtractionError> {
            Ok(ExtractionResult {
                state: state.to_string(),
                layer: layer.to_string(),
                boundaries: vec![],
                feature_count: self.feature_count,
                expected_count: None,
                success: true,
            })
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl ExtractionProvider for AlwaysFails {
        async fn extract(&self, _state: &str, _layer: &str) -> Result<ExtractionResult, ExtractionError> {
            Err(ExtractionError::FetchFailed {
                message: "injected failure".to_string(),
                retryable: false,
            })
        }
    }

    fn resolver(fail_states: &'static [&'static str]) -> ProviderResolver {
        Arc::new(move |state: &str, _layer: &str| {
            if fail_states.contains(&state) {
                Some(Arc::new(AlwaysFails) as Arc<dyn ExtractionProvider>)
            } else {
                Some(Arc::new(AlwaysSucceeds { feature_count: 3 }) as Arc<dyn ExtractionProvider>)
            }
        })
    }

    fn no_op_progress() -> Arc<dyn Fn(ProgressEvent) + Send + Sync> {
        Arc::new(|_| {})
    }

    #[tokio::test]
    async fn orchestrate_marks_job_completed_when_everything_succeeds() {
        let dir = tempdir().unwrap();
        let store = JobStore::new(dir.path());
        let scope = JobScope {
            states: vec!["06".to_string(), "15".to_string()],
            layers: vec!["congressional".to_string()],
        };
        let options = JobOptions {
            concurrency: 2,
            retry_delay_ms: 1,
            ..JobOptions::default()
        };
        let now = DateTime::from_timestamp(0, 0).unwrap();

        let (job, counts) = orchestrate(
            store,
            scope,
            options,
            resolver(&[]),
            ExpectedCountRegistry::new(),
            no_op_progress(),
            CancelToken::new(),
            now,
        )
        .await
        .unwrap();

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress.completed, 2);
        assert_eq!(counts.len(), 2);
    }

    #[tokio::test]
    async fn orchestrate_marks_job_partial_on_mixed_outcomes() {
        let dir = tempdir().unwrap();
        let store = JobStore::new(dir.path());
        let scope = JobScope {
            states: vec!["06".to_string(), "15".to_string()],
            layers: vec!["congressional".to_string()],
        };
        let options = JobOptions {
            concurrency: 2,
            retry_delay_ms: 1,
            max_retries: 0,
            ..JobOptions::default()
        };
        let now = DateTime::from_timestamp(0, 0).unwrap();

        let (job, _) = orchestrate(
            store,
            scope,
            options,
            resolver(&["15"]),
            ExpectedCountRegistry::new(),
            no_op_progress(),
            CancelToken::new(),
            now,
        )
        .await
        .unwrap();

        assert_eq!(job.status, JobStatus::Partial);
        assert_eq!(job.progress.completed, 1);
        assert_eq!(job.progress.failed, 1);
    }

    #[tokio::test]
    async fn resume_only_reruns_failed_tasks() {
        let dir = tempdir().unwrap();
        let store = JobStore::new(dir.path());
        let scope = JobScope {
            states: vec!["06".to_string(), "15".to_string(), "36".to_string()],
            layers: vec!["congressional".to_string()],
        };
        let options = JobOptions {
            concurrency: 3,
            retry_delay_ms: 1,
            max_retries: 0,
            ..JobOptions::default()
        };
        let now = DateTime::from_timestamp(0, 0).unwrap();

        let (job, _) = orchestrate(
            store.clone(),
            scope,
            options,
            resolver(&["15"]),
            ExpectedCountRegistry::new(),
            no_op_progress(),
            CancelToken::new(),
            now,
        )
        .await
        .unwrap();
        assert_eq!(job.status, JobStatus::Partial);

        let call_count = Arc::new(AtomicUsize::new(0));
        let counting_resolver: ProviderResolver = {
            let call_count = Arc::clone(&call_count);
            Arc::new(move |_state: &str, _layer: &str| {
                call_count.fetch_add(1, Ordering::SeqCst);
                Some(Arc::new(AlwaysSucceeds { feature_count: 3 }) as Arc<dyn ExtractionProvider>)
            })
        };

        let (resumed, _) = resume(
            store,
            &job.job_id,
            counting_resolver,
            ExpectedCountRegistry::new(),
            no_op_progress(),
            CancelToken::new(),
            now,
        )
        .await
        .unwrap();

        assert_eq!(resumed.status, JobStatus::Completed);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn orchestrate_reports_cancelled_when_token_is_pre_cancelled() {
        let dir = tempdir().unwrap();
        let store = JobStore::new(dir.path());
        let scope = JobScope {
            states: vec!["06".to_string(), "15".to_string()],
            layers: vec!["congressional".to_string()],
        };
        let options = JobOptions {
            concurrency: 2,
            retry_delay_ms: 1,
            ..JobOptions::default()
        };
        let now = DateTime::from_timestamp(0, 0).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();

        let (job, counts) = orchestrate(
            store,
            scope,
            options,
            resolver(&[]),
            ExpectedCountRegistry::new(),
            no_op_progress(),
            cancel,
            now,
        )
        .await
        .unwrap();

        assert_eq!(job.status, JobStatus::Cancelled);
        assert_eq!(job.progress.completed, 0);
        assert!(counts.is_empty());
    }

    struct SlowSucceeds {
        feature_count: u64,
        delay_ms: u64,
    }

    #[async_trait]
    impl ExtractionProvider for SlowSucceeds {
        async fn extract(&self, state: &str, layer: &str) -> Result<ExtractionResult, ExtractionError> {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
            Ok(ExtractionResult {
                state: state.to_string(),
                layer: layer.to_string(),
                boundaries: vec![],
                feature_count: self.feature_count,
                expected_count: None,
                success: true,
            })
        }
    }

    /// A caller that holds its own clone of the `CancelToken` can stop a
    /// run already in flight: this spawns `orchestrate` as its own task so
    /// it runs concurrently with the cancelling task, mirroring how a real
    /// caller (e.g. an HTTP handler backing a `DELETE /jobs/:id` route)
    /// would use the returned-nothing, externally-held token (§4.8 step 6).
    #[tokio::test]
    async fn a_caller_holding_the_token_can_cancel_a_running_job_from_outside() {
        let dir = tempdir().unwrap();
        let store = JobStore::new(dir.path());
        let scope = JobScope {
            states: vec!["06".to_string(), "15".to_string(), "36".to_string(), "48".to_string()],
            layers: vec!["congressional".to_string()],
        };
        let options = JobOptions {
            concurrency: 1,
            retry_delay_ms: 1,
            rate_limit_sleep_ms: 0,
            ..JobOptions::default()
        };
        let now = DateTime::from_timestamp(0, 0).unwrap();

        let slow_resolver: ProviderResolver = Arc::new(|_state: &str, _layer: &str| {
            Some(Arc::new(SlowSucceeds { feature_count: 1, delay_ms: 30 }) as Arc<dyn ExtractionProvider>)
        });

        let cancel = CancelToken::new();
        let canceller = cancel.clone();

        let run = tokio::spawn(orchestrate(
            store,
            scope,
            options,
            slow_resolver,
            ExpectedCountRegistry::new(),
            no_op_progress(),
            cancel,
            now,
        ));
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        canceller.cancel();

        let (job, _) = run.await.unwrap().unwrap();

        assert_eq!(job.status, JobStatus::Cancelled);
        assert!(
            job.progress.completed < 4,
            "cancellation must stop the run before every task is claimed"
        );
    }
}

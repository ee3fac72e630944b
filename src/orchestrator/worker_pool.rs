//! Bounded worker pool (§4.8 step 2, §5): up to `concurrency` tasks run
//! concurrently, sharing a single-owner atomic index into the task queue so
//! no two workers ever claim the same task.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Claims tasks from a fixed-size queue by atomically incrementing a shared
/// cursor. Each index is handed out to exactly one caller.
pub struct TaskCursor {
    next: AtomicUsize,
    len: usize,
}

impl TaskCursor {
    /// A cursor over `len` tasks, starting at `start` (nonzero on resume).
    pub fn new(len: usize, start: usize) -> Self {
        Self {
            next: AtomicUsize::new(start),
            len,
        }
    }

    /// Claim the next index, or `None` once the queue is exhausted.
    pub fn claim(&self) -> Option<usize> {
        let i = self.next.fetch_add(1, Ordering::SeqCst);
        if i < self.len {
            Some(i)
        } else {
            None
        }
    }
}

/// Cooperative cancellation flag: workers check it before claiming another
/// task; in-flight tasks always run to completion (§5 cancellation policy).
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, not-yet-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Run `worker(index, item)` over `items` with at most `concurrency` tasks
/// in flight at once, claiming work through a shared [`TaskCursor`] so
/// completion order reflects finish order, not start order (§5 ordering
/// guarantee). Returns results in queue order once every task (claimed or
/// skipped by cancellation) has been accounted for.
pub async fn run_bounded<T, F, Fut, R>(items: Vec<T>, concurrency: usize, cancel: CancelToken, worker: F) -> Vec<Option<R>>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(usize, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: Send + 'static,
{
    let len = items.len();
    let items = Arc::new(items);
    let cursor = Arc::new(TaskCursor::new(len, 0));
    let worker = Arc::new(worker);
    let results: Arc<std::sync::Mutex<Vec<Option<R>>>> = Arc::new(std::sync::Mutex::new((0..len).map(|_| None).collect()));

    let concurrency = concurrency.max(1).min(len.max(1));
    let mut handles = Vec::with_capacity(concurrency);
    for _ in 0..concurrency {
        let items = Arc::clone(&items);
        let cursor = Arc::clone(&cursor);
        let worker = Arc::clone(&worker);
        let results = Arc::clone(&results);
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            loop {
                if cancel.is_cancelled() {
                    break;
                }
                let Some(index) = cursor.claim() else { break };
                let item = items[index].clone();
                let result = worker(index, item).await;
                results.lock().unwrap()[index] = Some(result);
            }
        }));
    }
    for handle in handles {
        let _ = handle.await;
    }

    Arc::try_unwrap(results).unwrap().into_inner().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_hands_out_each_index_once() {
        let cursor = TaskCursor::new(3, 0);
        assert_eq!(cursor.claim(), Some(0));
        assert_eq!(cursor.claim(), Some(1));
        assert_eq!(cursor.claim(), Some(2));
        assert_eq!(cursor.claim(), None);
    }

    #[test]
    fn cursor_resumes_from_start_offset() {
        let cursor = TaskCursor::new(5, 3);
        assert_eq!(cursor.claim(), Some(3));
        assert_eq!(cursor.claim(), Some(4));
        assert_eq!(cursor.claim(), None);
    }

    #[tokio::test]
    async fn run_bounded_processes_all_items() {
        let items: Vec<u32> = (0..10).collect();
        let results = run_bounded(items, 3, CancelToken::new(), |_, x| async move { x * 2 }).await;
        assert_eq!(results.len(), 10);
        for (i, r) in results.iter().enumerate() {
            assert_eq!(*r, Some(i as u32 * 2));
        }
    }

    #[tokio::test]
    async fn cancellation_stops_new_claims() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let items: Vec<u32> = (0..5).collect();
        let results = run_bounded(items, 2, cancel, |_, x| async move { x }).await;
        assert!(results.iter().all(|r| r.is_none()));
    }
}

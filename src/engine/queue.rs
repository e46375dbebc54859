//! Serialized update queue.
//!
//! A strict concurrency-1 FIFO task runner. Every mutation of the cookie
//! store, the tab registry and the correlation map goes through here, so
//! tasks submitted from independent event sources never interleave.
//!
//! Tasks run on a single worker spawned onto the current tokio runtime.
//! A task that fails or panics is logged and does not stop the worker.

use crate::base::error::EngineError;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;

/// A unit of work accepted by the queue.
pub type QueueTask = BoxFuture<'static, Result<(), EngineError>>;

struct Job {
    id: u64,
    label: &'static str,
    task: QueueTask,
    done: oneshot::Sender<Result<(), EngineError>>,
}

struct Shared {
    pending: Mutex<VecDeque<Job>>,
    wakeup: Notify,
    running: AtomicBool,
    next_id: AtomicU64,
}

impl Shared {
    fn pending(&self) -> MutexGuard<'_, VecDeque<Job>> {
        // Jobs are only pushed and popped under the lock, never polled,
        // so a poisoned queue is still consistent.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Completion handle of a submitted task.
///
/// Resolves to the task's result, or to [`EngineError::TaskDiscarded`] if
/// the task was drained before it started. Dropping the handle does not
/// cancel the task.
#[derive(Debug)]
pub struct TaskHandle {
    id: u64,
    rx: oneshot::Receiver<Result<(), EngineError>>,
}

impl TaskHandle {
    /// Submission sequence number; increases in FIFO order.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Future for TaskHandle {
    type Output = Result<(), EngineError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|result| result.unwrap_or(Err(EngineError::TaskDiscarded)))
    }
}

/// Single-concurrency FIFO task queue.
pub struct SerializedQueue {
    shared: Arc<Shared>,
    worker: JoinHandle<()>,
}

impl SerializedQueue {
    /// Create the queue and spawn its worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> Self {
        let shared = Arc::new(Shared {
            pending: Mutex::new(VecDeque::new()),
            wakeup: Notify::new(),
            running: AtomicBool::new(false),
            next_id: AtomicU64::new(0),
        });
        let worker = tokio::spawn(run_worker(Arc::clone(&shared)));
        Self { shared, worker }
    }

    /// Enqueue a task. Returns immediately; the task runs after every task
    /// submitted before it has finished.
    pub fn submit<F>(&self, label: &'static str, task: F) -> TaskHandle
    where
        F: Future<Output = Result<(), EngineError>> + Send + 'static,
    {
        let (done, rx) = oneshot::channel();
        let mut pending = self.shared.pending();
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        if self.worker.is_finished() {
            let _ = done.send(Err(EngineError::QueueClosed));
            return TaskHandle { id, rx };
        }

        pending.push_back(Job {
            id,
            label,
            task: task.boxed(),
            done,
        });
        drop(pending);
        self.shared.wakeup.notify_one();
        tracing::trace!(task_id = id, label, "task queued");
        TaskHandle { id, rx }
    }

    /// Discard every task that has not started yet.
    ///
    /// A task that is already running completes normally. Handles of the
    /// discarded tasks resolve to [`EngineError::TaskDiscarded`].
    pub fn drain_and_reset(&self) -> usize {
        let discarded: Vec<Job> = self.shared.pending().drain(..).collect();
        let count = discarded.len();
        if count > 0 {
            tracing::debug!(discarded = count, "update queue drained");
        }
        count
    }

    /// Number of tasks waiting to start.
    pub fn len(&self) -> usize {
        self.shared.pending().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether no task is running or waiting.
    pub fn is_idle(&self) -> bool {
        let pending = self.shared.pending();
        pending.is_empty() && !self.shared.running.load(Ordering::Acquire)
    }

    /// Wait until every task submitted before this call has finished.
    ///
    /// Returns early if the barrier itself is drained.
    pub async fn wait_idle(&self) {
        let _ = self.submit("barrier", async { Ok(()) }).await;
    }
}

impl Default for SerializedQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SerializedQueue {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

impl std::fmt::Debug for SerializedQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializedQueue")
            .field("pending", &self.len())
            .field("running", &self.shared.running.load(Ordering::Relaxed))
            .finish()
    }
}

async fn run_worker(shared: Arc<Shared>) {
    loop {
        let next = {
            let mut pending = shared.pending();
            let job = pending.pop_front();
            shared.running.store(job.is_some(), Ordering::Release);
            job
        };
        let Some(job) = next else {
            shared.wakeup.notified().await;
            continue;
        };

        let result = match AssertUnwindSafe(job.task).catch_unwind().await {
            Ok(result) => result,
            Err(_) => Err(EngineError::TaskPanicked { label: job.label }),
        };
        shared.running.store(false, Ordering::Release);

        if let Err(e) = &result {
            tracing::warn!(task_id = job.id, label = job.label, error = %e, "queued task failed");
        }
        // The submitter may have dropped its handle.
        let _ = job.done.send(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handle_reports_task_error() {
        let queue = SerializedQueue::new();
        let handle = queue.submit("failing", async { Err(EngineError::store("boom")) });
        assert_eq!(handle.await, Err(EngineError::store("boom")));
    }

    #[tokio::test]
    async fn test_ids_increase() {
        let queue = SerializedQueue::new();
        let first = queue.submit("a", async { Ok(()) });
        let second = queue.submit("b", async { Ok(()) });
        assert!(first.id() < second.id());
        queue.wait_idle().await;
        assert!(queue.is_idle());
    }
}

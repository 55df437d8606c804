//! Single-consumer commit queue.
//!
//! ```text
//! submit(k1) ─┐                       ┌──► waiters(k1)
//! submit(k2) ─┼──► mpsc ──► worker ───┼──► waiters(k2)
//! submit(k1) ─┘ (dedup: joins k1)     └──► ...
//! ```
//!
//! The worker takes one unit at a time and runs it to completion before
//! dequeuing the next. A key stays in the waiter map from submission until
//! its unit completes; a resubmission in that window joins the existing
//! waiters instead of enqueuing a second unit.

use crate::errors::PipelineError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, trace};

/// A boxed processing unit.
pub type Unit<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'static>>;

type Waiters<T, E> = Vec<oneshot::Sender<Result<T, E>>>;

struct Job<K, T, E> {
    key: K,
    unit: Unit<T, E>,
}

struct Shared<K, T, E> {
    waiters: Mutex<HashMap<K, Waiters<T, E>>>,
    running: Mutex<Option<K>>,
    queued: AtomicUsize,
}

/// Outcome of a submitted unit, shared by every submitter of its key.
#[must_use = "the outcome is only observable by awaiting it"]
pub struct PendingResult<T, E> {
    receiver: oneshot::Receiver<Result<T, E>>,
}

impl<T, E> PendingResult<T, E> {
    fn resolved(outcome: Result<T, E>) -> Self {
        let (sender, receiver) = oneshot::channel();
        let _ = sender.send(outcome);
        Self { receiver }
    }
}

impl<T, E: From<PipelineError>> Future for PendingResult<T, E> {
    type Output = Result<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(PipelineError::Closed.into())))
    }
}

/// Strictly ordered queue of units with per-key deduplication.
///
/// Must be created inside a tokio runtime: construction spawns the consumer
/// task, which stops once the pipeline is dropped and the queue drained.
pub struct FifoPipeline<K, T, E> {
    sender: mpsc::UnboundedSender<Job<K, T, E>>,
    shared: Arc<Shared<K, T, E>>,
}

impl<K, T, E> FifoPipeline<K, T, E>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
    T: Clone + Send + 'static,
    E: Clone + Send + From<PipelineError> + 'static,
{
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            waiters: Mutex::new(HashMap::new()),
            running: Mutex::new(None),
            queued: AtomicUsize::new(0),
        });
        tokio::spawn(consume(receiver, Arc::clone(&shared)));
        Self { sender, shared }
    }

    /// Enqueue `unit` under `key`, or join the unit already pending for it.
    pub fn submit<F>(&self, key: K, unit: F) -> PendingResult<T, E>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (waiter, receiver) = oneshot::channel();
        let mut waiters = self.shared.waiters.lock();

        if let Some(existing) = waiters.get_mut(&key) {
            existing.push(waiter);
            debug!(key = ?key, waiters = existing.len(), "Joined pending unit");
            return PendingResult { receiver };
        }

        let job = Job {
            key: key.clone(),
            unit: Box::pin(unit),
        };
        let queued = self.shared.queued.fetch_add(1, Ordering::SeqCst) + 1;
        if self.sender.send(job).is_err() {
            self.shared.queued.fetch_sub(1, Ordering::SeqCst);
            error!(key = ?key, "Commit pipeline consumer is gone");
            return PendingResult::resolved(Err(PipelineError::Closed.into()));
        }
        waiters.insert(key.clone(), vec![waiter]);
        trace!(key = ?key, queued, "Unit enqueued");
        PendingResult { receiver }
    }

    /// Units waiting behind the running one.
    pub fn queued(&self) -> usize {
        self.shared.queued.load(Ordering::SeqCst)
    }

    /// Key of the unit currently running.
    pub fn in_flight(&self) -> Option<K> {
        self.shared.running.lock().clone()
    }

    /// Whether a unit is queued or running under `key`.
    pub fn is_pending(&self, key: &K) -> bool {
        self.shared.waiters.lock().contains_key(key)
    }
}

impl<K, T, E> Default for FifoPipeline<K, T, E>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
    T: Clone + Send + 'static,
    E: Clone + Send + From<PipelineError> + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

async fn consume<K, T, E>(
    mut receiver: mpsc::UnboundedReceiver<Job<K, T, E>>,
    shared: Arc<Shared<K, T, E>>,
)
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
    T: Clone + Send + 'static,
    E: Clone + Send + From<PipelineError> + 'static,
{
    while let Some(Job { key, unit }) = receiver.recv().await {
        shared.queued.fetch_sub(1, Ordering::SeqCst);
        *shared.running.lock() = Some(key.clone());

        // A panicking unit only takes its own task down.
        let outcome = match tokio::spawn(unit).await {
            Ok(outcome) => outcome,
            Err(join_error) => {
                error!(key = ?key, error = %join_error, "Commit unit panicked");
                Err(PipelineError::UnitPanicked.into())
            }
        };

        let waiters = shared.waiters.lock().remove(&key).unwrap_or_default();
        *shared.running.lock() = None;
        debug!(
            key = ?key,
            ok = outcome.is_ok(),
            waiters = waiters.len(),
            "Unit completed"
        );
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }
    debug!("Commit pipeline consumer stopped");
}

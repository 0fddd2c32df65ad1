//! # Shared Sequence - Serialized Task Sequencer
//!
//! A single ordered queue that every state-mutating operation (block apply,
//! round tick, sync step) must go through, guaranteeing no two mutations
//! race.
//!
//! Tasks are enqueued and executed strictly one at a time, in FIFO order.
//! The next task starts only after the previous one fully completes,
//! including its asynchronous I/O. This is a cooperative single-writer
//! model: network and persistence I/O may be non-blocking under the hood,
//! but no two sequenced tasks ever interleave their effects.
//!
//! Two independent instances exist at runtime: one for consensus-critical
//! work and one for balance-affecting API submissions, so user-facing
//! submissions do not starve sync and forge tasks. Each serializes among
//! itself only.

use futures::future::BoxFuture;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

/// A unit of sequenced work.
pub type SequencedTask = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Errors from enqueueing onto a sequence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SequenceError {
    /// The worker task has shut down; no further work is accepted.
    #[error("Sequence '{0}' is closed")]
    Closed(String),
}

/// An ordered, single-worker task queue.
///
/// Dropping the `Sequence` closes the queue; already-enqueued tasks still
/// run to completion before the worker exits.
pub struct Sequence {
    label: String,
    sender: mpsc::UnboundedSender<SequencedTask>,
    pending: Arc<AtomicUsize>,
}

impl Sequence {
    /// Create a sequence and spawn its worker on the current tokio runtime.
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        let (sender, mut receiver) = mpsc::unbounded_channel::<SequencedTask>();
        let pending = Arc::new(AtomicUsize::new(0));

        let worker_label = label.clone();
        let worker_pending = Arc::clone(&pending);
        tokio::spawn(async move {
            while let Some(task) = receiver.recv().await {
                // One task completes fully before the next starts.
                task().await;
                worker_pending.fetch_sub(1, Ordering::Release);
            }
            debug!(sequence = %worker_label, "Sequence worker stopped");
        });

        Self {
            label,
            sender,
            pending,
        }
    }

    /// Enqueue a task. Tasks run in FIFO order, one at a time.
    pub fn add<F, Fut>(&self, job: F) -> Result<(), SequenceError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let task: SequencedTask = Box::new(move || Box::pin(job()));
        self.pending.fetch_add(1, Ordering::Acquire);
        self.sender.send(task).map_err(|_| {
            self.pending.fetch_sub(1, Ordering::Release);
            SequenceError::Closed(self.label.clone())
        })
    }

    /// Enqueue a task and receive its result once it has run.
    pub fn submit<T, F, Fut>(&self, job: F) -> Result<oneshot::Receiver<T>, SequenceError>
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.add(move || async move {
            let result = job().await;
            // Receiver may have gone away; the task itself still ran.
            let _ = tx.send(result);
        })?;
        Ok(rx)
    }

    /// Number of tasks enqueued but not yet completed.
    pub fn len(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Whether no tasks are enqueued or running.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The label this sequence logs under.
    pub fn label(&self) -> &str {
        &self.label
    }
}

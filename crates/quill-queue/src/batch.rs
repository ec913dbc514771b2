//! Sequential batch queue.
//!
//! Entries go through an unbounded channel whose only receiver is the pump
//! task, so ordering and "one consumer at a time" come from ownership
//! rather than a shared flag. The pump holds a semaphore permit for each
//! entry until the runner reports the entry's job terminal; with one
//! permit the backlog is drained strictly in order, one job at a time.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use quill_models::BatchEntry;

use crate::error::{QueueError, QueueResult};

/// Executes one batch entry.
///
/// `run_entry` must not return until the entry's job is terminal (or was
/// never started), since the pump releases the entry's slot on return.
#[async_trait]
pub trait BatchRunner: Send + Sync + 'static {
    async fn run_entry(&self, entry: BatchEntry);
}

/// Handle to a running batch queue. Dropping it (or calling
/// [`close`](Self::close)) lets the pump finish the backlog and exit.
pub struct BatchQueue {
    tx: mpsc::UnboundedSender<BatchEntry>,
    queued: Arc<AtomicUsize>,
    active: Arc<AtomicUsize>,
    pump: JoinHandle<()>,
}

impl BatchQueue {
    /// Spawn the pump task.
    pub fn start<R: BatchRunner>(runner: Arc<R>, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        let (tx, rx) = mpsc::unbounded_channel();
        let queued = Arc::new(AtomicUsize::new(0));
        let active = Arc::new(AtomicUsize::new(0));

        let pump = tokio::spawn(pump(
            rx,
            runner,
            max_concurrent,
            Arc::clone(&queued),
            Arc::clone(&active),
        ));
        info!("Batch queue started with {} max concurrent jobs", max_concurrent);

        Self {
            tx,
            queued,
            active,
            pump,
        }
    }

    /// Append one entry to the backlog.
    pub fn enqueue(&self, entry: BatchEntry) -> QueueResult<()> {
        self.queued.fetch_add(1, Ordering::SeqCst);
        self.tx.send(entry).map_err(|_| {
            self.queued.fetch_sub(1, Ordering::SeqCst);
            QueueError::Closed
        })
    }

    /// Append entries in order, returning how many were accepted.
    pub fn enqueue_all(&self, entries: impl IntoIterator<Item = BatchEntry>) -> QueueResult<usize> {
        let mut accepted = 0;
        for entry in entries {
            self.enqueue(entry)?;
            accepted += 1;
        }
        debug!(accepted, "Batch entries enqueued");
        Ok(accepted)
    }

    /// Entries waiting for a slot.
    pub fn len(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries currently running.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop accepting entries and wait for the pump to hand out the backlog.
    pub async fn close(self) {
        drop(self.tx);
        if let Err(e) = self.pump.await {
            error!("Batch pump task failed: {}", e);
        }
    }
}

struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn pump<R: BatchRunner>(
    mut rx: mpsc::UnboundedReceiver<BatchEntry>,
    runner: Arc<R>,
    max_concurrent: usize,
    queued: Arc<AtomicUsize>,
    active: Arc<AtomicUsize>,
) {
    let semaphore = Arc::new(Semaphore::new(max_concurrent));
    while let Some(entry) = rx.recv().await {
        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            break;
        };

        queued.fetch_sub(1, Ordering::SeqCst);
        active.fetch_add(1, Ordering::SeqCst);
        let guard = ActiveGuard(Arc::clone(&active));
        let runner = Arc::clone(&runner);

        tokio::spawn(async move {
            let _permit = permit;
            let _guard = guard;
            runner.run_entry(entry).await;
        });
    }

    // Wait for in-flight entries before reporting the queue drained.
    let permits = u32::try_from(max_concurrent).unwrap_or(u32::MAX);
    let _ = semaphore.acquire_many(permits).await;
    debug!("Batch pump stopped");
}

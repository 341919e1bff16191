//! Bounded ingestion queue between sensor workers and the storage writer.
//!
//! A thin wrapper over a tokio `mpsc` channel: enqueue waits for capacity
//! instead of dropping, and dequeue takes a bounded wait so the writer can
//! notice a stop request on an idle queue.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serverroom_core::reading::Reading;
use tokio::sync::mpsc;

/// Returned when the writer side of the queue is gone or closed.
#[derive(Debug, thiserror::Error)]
#[error("Ingestion queue is closed")]
pub struct QueueClosed(pub Reading);

/// Outcome of one bounded dequeue.
#[derive(Debug)]
pub enum Dequeued {
    Reading(Reading),
    /// Nothing arrived within the wait.
    Timeout,
    /// Closed and fully drained.
    Closed,
}

/// Create a queue holding at most `capacity` readings.
pub fn channel(capacity: usize) -> (QueueSender, QueueReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let enqueued = Arc::new(AtomicU64::new(0));
    (
        QueueSender {
            tx,
            enqueued: Arc::clone(&enqueued),
        },
        QueueReceiver { rx },
    )
}

/// Producer handle; cloned once per worker.
#[derive(Debug, Clone)]
pub struct QueueSender {
    tx: mpsc::Sender<Reading>,
    enqueued: Arc<AtomicU64>,
}

impl QueueSender {
    /// Append a reading, waiting while the queue is full.
    pub async fn enqueue(&self, reading: Reading) -> Result<(), QueueClosed> {
        self.tx
            .send(reading)
            .await
            .map_err(|mpsc::error::SendError(r)| QueueClosed(r))?;
        self.enqueued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Readings successfully enqueued through any clone of this sender.
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    /// Shared counter behind [`enqueued`](Self::enqueued), readable after
    /// every sender is dropped.
    pub fn enqueued_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.enqueued)
    }
}

/// Consumer handle, owned by the single writer.
#[derive(Debug)]
pub struct QueueReceiver {
    rx: mpsc::Receiver<Reading>,
}

impl QueueReceiver {
    /// Wait up to `wait` for the next reading.
    pub async fn recv_timeout(&mut self, wait: Duration) -> Dequeued {
        match tokio::time::timeout(wait, self.rx.recv()).await {
            Ok(Some(reading)) => Dequeued::Reading(reading),
            Ok(None) => Dequeued::Closed,
            Err(_) => Dequeued::Timeout,
        }
    }

    /// Next reading; `None` once closed and drained.
    pub async fn recv(&mut self) -> Option<Reading> {
        self.rx.recv().await
    }

    /// Refuse further enqueues. Readings already queued stay receivable.
    pub fn close(&mut self) {
        self.rx.close();
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

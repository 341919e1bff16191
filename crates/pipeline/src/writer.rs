//! The single storage writer.
//!
//! Exactly one [`StorageWriter`] consumes the ingestion queue. It is the only
//! component that writes sensor snapshots, measurements and alerts, so the
//! database never sees concurrent writers.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serverroom_core::reading::Reading;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::{PersistFailurePolicy, ShutdownPolicy};
use crate::queue::{Dequeued, QueueReceiver};
use crate::store::ReadingStore;

/// Observable lifecycle of the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    Idle,
    Running,
    Draining,
    Stopped,
}

/// Counters accumulated over one writer run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriterStats {
    /// Readings taken off the queue for persistence.
    pub received: u64,
    pub persisted: u64,
    /// Persisted readings that also produced an alert.
    pub alerts: u64,
    /// Readings dropped after exhausting the failure policy.
    pub failed: u64,
    /// Readings left in the queue under [`ShutdownPolicy::Discard`].
    pub discarded: u64,
}

/// Writer tuning.
#[derive(Debug, Clone, Copy)]
pub struct WriterOptions {
    pub poll_timeout: Duration,
    pub retry_backoff: Duration,
    pub shutdown_policy: ShutdownPolicy,
    pub failure_policy: PersistFailurePolicy,
}

pub struct StorageWriter<S> {
    store: Arc<S>,
    queue: QueueReceiver,
    options: WriterOptions,
    stats: WriterStats,
    state: watch::Sender<WriterState>,
}

impl<S: ReadingStore> StorageWriter<S> {
    pub fn new(store: Arc<S>, queue: QueueReceiver, options: WriterOptions) -> Self {
        let (state, _) = watch::channel(WriterState::Idle);
        Self {
            store,
            queue,
            options,
            stats: WriterStats::default(),
            state,
        }
    }

    /// Subscribe to state changes.
    pub fn state(&self) -> watch::Receiver<WriterState> {
        self.state.subscribe()
    }

    /// Consume the queue until `stop` fires (then apply the shutdown policy)
    /// or every producer is gone.
    pub async fn run(mut self, stop: CancellationToken) -> WriterStats {
        self.state.send_replace(WriterState::Running);
        tracing::info!(
            shutdown_policy = %self.options.shutdown_policy,
            failure_policy = %self.options.failure_policy,
            "Storage writer started"
        );

        loop {
            let next = tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                next = self.queue.recv_timeout(self.options.poll_timeout) => next,
            };

            match next {
                Dequeued::Reading(reading) => self.handle(reading).await,
                Dequeued::Timeout => continue,
                Dequeued::Closed => {
                    tracing::info!("Ingestion queue closed");
                    break;
                }
            }
        }

        self.state.send_replace(WriterState::Draining);
        self.queue.close();
        match self.options.shutdown_policy {
            ShutdownPolicy::Drain => {
                let backlog = self.queue.len();
                if backlog > 0 {
                    tracing::info!(backlog, "Draining queued readings");
                }
                while let Some(reading) = self.queue.recv().await {
                    self.handle(reading).await;
                }
            }
            ShutdownPolicy::Discard => {
                while self.queue.recv().await.is_some() {
                    self.stats.discarded += 1;
                }
                if self.stats.discarded > 0 {
                    tracing::warn!(discarded = self.stats.discarded, "Discarded queued readings");
                }
            }
        }

        self.state.send_replace(WriterState::Stopped);
        tracing::info!(
            received = self.stats.received,
            persisted = self.stats.persisted,
            alerts = self.stats.alerts,
            failed = self.stats.failed,
            "Storage writer stopped"
        );
        self.stats
    }

    /// Persist one reading, applying the failure policy.
    async fn handle(&mut self, reading: Reading) {
        self.stats.received += 1;
        let max_attempts = self.options.failure_policy.max_attempts();

        for attempt in 1..=max_attempts {
            match self.store.persist(&reading).await {
                Ok(recorded) => {
                    self.stats.persisted += 1;
                    if recorded.alert_id.is_some() {
                        self.stats.alerts += 1;
                    }
                    return;
                }
                Err(e) => {
                    tracing::warn!(
                        sensor_id = reading.sensor_id,
                        attempt,
                        max_attempts,
                        error = %e,
                        "Failed to persist reading"
                    );
                    tokio::time::sleep(self.options.retry_backoff).await;
                    if !e.is_transient() {
                        break;
                    }
                }
            }
        }

        self.stats.failed += 1;
        tracing::error!(sensor_id = reading.sensor_id, "Reading dropped");
    }
}

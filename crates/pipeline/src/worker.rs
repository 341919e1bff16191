//! Per-sensor sampling task.
//!
//! Each [`SensorWorker`] owns one sensor. It loops: generate a value,
//! classify it, enqueue the reading, then sleep the sampling interval. Only
//! the sleep is raced against cancellation, so a reading that was generated
//! is always handed to the queue before the worker exits.

use std::sync::Arc;
use std::time::Duration;

use serverroom_core::error::CoreError;
use serverroom_core::generator::ValueGenerator;
use serverroom_core::reading::Reading;
use serverroom_core::sensor::SensorConfig;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::queue::QueueSender;

/// Observable lifecycle of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

pub struct SensorWorker {
    config: SensorConfig,
    generator: Arc<ValueGenerator>,
    queue: QueueSender,
    retry_backoff: Duration,
    state: watch::Sender<WorkerState>,
}

impl SensorWorker {
    pub fn new(
        config: SensorConfig,
        generator: Arc<ValueGenerator>,
        queue: QueueSender,
        retry_backoff: Duration,
    ) -> Self {
        let (state, _) = watch::channel(WorkerState::Idle);
        Self {
            config,
            generator,
            queue,
            retry_backoff,
            state,
        }
    }

    /// Subscribe to state changes.
    pub fn state(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    /// Generate and classify one reading.
    pub fn sample(&self) -> Result<Reading, CoreError> {
        let c = &self.config;
        let value = self.generator.next(c.sensor_id, c.sensor_type, &c.thresholds)?;
        Ok(Reading::classified(c.sensor_id, value, &c.thresholds))
    }

    /// Run until `cancel` fires or the queue closes.
    pub async fn run(self, cancel: CancellationToken) {
        let sensor_id = self.config.sensor_id;
        self.state.send_replace(WorkerState::Running);
        tracing::debug!(
            sensor_id,
            sensor_type = %self.config.sensor_type,
            interval_ms = self.config.sampling_interval.as_millis() as u64,
            "Sensor worker started"
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let pause = match self.sample() {
                Ok(reading) => match self.queue.enqueue(reading).await {
                    Ok(()) => self.config.sampling_interval,
                    Err(e) => {
                        tracing::warn!(sensor_id, error = %e, "Queue closed, worker exiting");
                        break;
                    }
                },
                Err(e) => {
                    tracing::warn!(sensor_id, error = %e, "Sample generation failed");
                    self.retry_backoff
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        self.state.send_replace(WorkerState::Stopping);
        tracing::debug!(sensor_id, "Sensor worker stopped");
        self.state.send_replace(WorkerState::Stopped);
    }
}

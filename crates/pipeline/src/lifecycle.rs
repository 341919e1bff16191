//! Start and stop of the worker/writer arrangement.
//!
//! [`Monitor::start`] loads sensors from the store, spawns the storage
//! writer and then one worker per sensor. [`Monitor::stop`] cancels the
//! workers and waits for all of them before telling the writer to finish,
//! so every reading a worker managed to enqueue is seen by the writer and
//! then handled per the configured [`ShutdownPolicy`](crate::ShutdownPolicy).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serverroom_core::generator::ValueGenerator;
use serverroom_core::types::SensorId;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::queue;
use crate::store::ReadingStore;
use crate::worker::{SensorWorker, WorkerState};
use crate::writer::{StorageWriter, WriterOptions, WriterState, WriterStats};

/// Summary returned by [`Monitor::stop`].
#[derive(Debug, Clone, Serialize)]
pub struct ShutdownReport {
    pub sensors: usize,
    /// Readings the workers handed to the queue.
    pub enqueued: u64,
    pub writer: WriterStats,
    #[serde(skip)]
    pub elapsed: Duration,
}

struct RunningPipeline {
    workers: Vec<(SensorId, JoinHandle<()>)>,
    worker_states: Vec<watch::Receiver<WorkerState>>,
    worker_cancel: CancellationToken,
    writer: JoinHandle<WriterStats>,
    writer_state: watch::Receiver<WriterState>,
    writer_stop: CancellationToken,
    enqueued: Arc<AtomicU64>,
}

/// Supervisor for the sampling pipeline.
pub struct Monitor<S> {
    store: Arc<S>,
    config: PipelineConfig,
    generator: Arc<ValueGenerator>,
    running: Option<RunningPipeline>,
}

impl<S: ReadingStore> Monitor<S> {
    pub fn new(store: Arc<S>, config: PipelineConfig) -> Self {
        Self {
            store,
            config,
            generator: Arc::new(ValueGenerator::new()),
            running: None,
        }
    }

    /// Shared generator state (last value per sensor).
    pub fn generator(&self) -> &Arc<ValueGenerator> {
        &self.generator
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Readings enqueued so far in the current run (0 when stopped).
    pub fn enqueued(&self) -> u64 {
        self.running
            .as_ref()
            .map_or(0, |r| r.enqueued.load(Ordering::Relaxed))
    }

    /// Current state of every worker.
    pub fn worker_states(&self) -> Vec<WorkerState> {
        self.running
            .as_ref()
            .map(|r| r.worker_states.iter().map(|s| *s.borrow()).collect())
            .unwrap_or_default()
    }

    pub fn writer_state(&self) -> Option<WriterState> {
        self.running.as_ref().map(|r| *r.writer_state.borrow())
    }

    /// Load sensors and spawn the writer plus one worker per sensor.
    ///
    /// Calling this while already running does nothing. Nothing is spawned
    /// unless every sensor passes validation.
    pub async fn start(&mut self) -> Result<(), PipelineError> {
        if self.running.is_some() {
            tracing::debug!("Monitor already running");
            return Ok(());
        }

        let sensors = self.store.load_sensors().await?;
        if sensors.is_empty() {
            return Err(PipelineError::NoSensors);
        }

        let mut configs = Vec::with_capacity(sensors.len());
        for sensor in &sensors {
            let config = sensor.to_config(self.config.sampling_slowdown);
            config
                .validate()
                .map_err(|e| PipelineError::InvalidSensor {
                    sensor_id: sensor.id,
                    reason: e.to_string(),
                })?;
            // Resume the walk from the last persisted value.
            if let Some(last) = sensor.last_reading {
                if self.generator.last_value(sensor.id).is_none() {
                    self.generator.seed(sensor.id, last);
                }
            }
            configs.push(config);
        }

        let (tx, rx) = queue::channel(self.config.queue_capacity);
        let enqueued = tx.enqueued_counter();

        let writer = StorageWriter::new(
            Arc::clone(&self.store),
            rx,
            WriterOptions {
                poll_timeout: self.config.writer_poll_timeout,
                retry_backoff: self.config.retry_backoff,
                shutdown_policy: self.config.shutdown_policy,
                failure_policy: self.config.persist_failure_policy,
            },
        );
        let writer_state = writer.state();
        let writer_stop = CancellationToken::new();
        let writer = tokio::spawn(writer.run(writer_stop.clone()));

        let worker_cancel = CancellationToken::new();
        let mut workers = Vec::with_capacity(configs.len());
        let mut worker_states = Vec::with_capacity(configs.len());
        for config in configs {
            let sensor_id = config.sensor_id;
            let worker = SensorWorker::new(
                config,
                Arc::clone(&self.generator),
                tx.clone(),
                self.config.retry_backoff,
            );
            worker_states.push(worker.state());
            workers.push((sensor_id, tokio::spawn(worker.run(worker_cancel.child_token()))));
        }
        drop(tx);

        tracing::info!(
            sensors = workers.len(),
            queue_capacity = self.config.queue_capacity,
            slowdown = self.config.sampling_slowdown,
            "Monitor started"
        );

        self.running = Some(RunningPipeline {
            workers,
            worker_states,
            worker_cancel,
            writer,
            writer_state,
            writer_stop,
            enqueued,
        });
        Ok(())
    }

    /// Stop every worker, then the writer, and report what happened.
    ///
    /// Returns `None` if the monitor was not running.
    pub async fn stop(&mut self) -> Option<ShutdownReport> {
        let running = self.running.take()?;
        let started = Instant::now();
        let sensors = running.workers.len();

        tracing::info!(sensors, "Stopping sensor workers");
        running.worker_cancel.cancel();
        for (sensor_id, handle) in running.workers {
            if let Err(e) = handle.await {
                tracing::error!(sensor_id, error = %e, "Sensor worker task failed");
            }
        }

        tracing::info!("Stopping storage writer");
        running.writer_stop.cancel();
        let writer = match running.writer.await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::error!(error = %e, "Storage writer task failed");
                WriterStats::default()
            }
        };

        let report = ShutdownReport {
            sensors,
            enqueued: running.enqueued.load(Ordering::Relaxed),
            writer,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            enqueued = report.enqueued,
            persisted = report.writer.persisted,
            alerts = report.writer.alerts,
            failed = report.writer.failed,
            discarded = report.writer.discarded,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Monitor stopped"
        );
        Some(report)
    }
}

impl<S> Drop for Monitor<S> {
    /// Signal every task of a run that was never stopped. The tasks wind
    /// down on their own; nothing is joined here.
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            tracing::warn!(
                sensors = running.workers.len(),
                "Monitor dropped while running, cancelling tasks"
            );
            running.worker_cancel.cancel();
            running.writer_stop.cancel();
        }
    }
}

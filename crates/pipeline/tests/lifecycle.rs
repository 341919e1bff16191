//! Pipeline behaviour against an in-memory store.
//!
//! Covers:
//! - Fail-fast start (no sensors, misconfigured sensor)
//! - Idempotent start/stop
//! - Single-writer accounting under both shutdown policies
//! - Alert correspondence and per-sensor ordering
//! - Persistence failure policies
//! - Shutdown liveness, including dropping a running monitor

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use parking_lot::Mutex;
use serverroom_core::reading::Reading;
use serverroom_core::sensor::SensorType;
use serverroom_core::thresholds::{SensorStatus, Thresholds};
use serverroom_db::models::sensor::Sensor;
use serverroom_db::repositories::RecordedReading;
use serverroom_pipeline::writer::WriterState;
use serverroom_pipeline::{
    Monitor, PersistFailurePolicy, PipelineConfig, PipelineError, ReadingStore, ShutdownPolicy,
    StoreError,
};

// ---------------------------------------------------------------------------
// Test store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryStore {
    sensors: Vec<Sensor>,
    persisted: Mutex<Vec<Reading>>,
    /// Number of upcoming persist calls that fail.
    failures: AtomicU32,
    write_delay: Duration,
}

impl MemoryStore {
    fn with_sensors(sensors: Vec<Sensor>) -> Self {
        Self {
            sensors,
            ..Default::default()
        }
    }

    fn persisted(&self) -> Vec<Reading> {
        self.persisted.lock().clone()
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn load_sensors(&self) -> Result<Vec<Sensor>, StoreError> {
        Ok(self.sensors.clone())
    }

    async fn persist(&self, reading: &Reading) -> Result<RecordedReading, StoreError> {
        if !self.write_delay.is_zero() {
            tokio::time::sleep(self.write_delay).await;
        }
        let should_fail = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(StoreError::Unavailable("injected failure".into()));
        }

        let mut persisted = self.persisted.lock();
        persisted.push(reading.clone());
        let id = persisted.len() as i64;
        Ok(RecordedReading {
            measurement_id: id,
            alert_id: (reading.status != SensorStatus::Normal).then_some(id),
        })
    }
}

fn sensor(id: i64, sensor_type: SensorType, thresholds: Thresholds) -> Sensor {
    Sensor {
        id,
        sensor_type: sensor_type.as_str().to_string(),
        last_reading: None,
        status: 0,
        last_reading_time: None,
        min_warning: thresholds.min_warning,
        max_warning: thresholds.max_warning,
        min_critical: thresholds.min_critical,
        max_critical: thresholds.max_critical,
    }
}

fn room() -> Vec<Sensor> {
    vec![
        sensor(
            1,
            SensorType::Temperature,
            Thresholds::new(Some(20.0), Some(30.0), Some(15.0), Some(35.0)),
        ),
        sensor(
            2,
            SensorType::Humidity,
            Thresholds::new(Some(30.0), Some(70.0), Some(20.0), Some(80.0)),
        ),
        sensor(
            3,
            SensorType::WaterLeak,
            Thresholds::new(Some(0.0), Some(1.0), Some(0.0), Some(1.0)),
        ),
        sensor(4, SensorType::Light, Thresholds::default()),
    ]
}

/// Fast intervals (10 ms for 1 s sensors) and short backoffs.
fn fast_config() -> PipelineConfig {
    PipelineConfig {
        queue_capacity: 16,
        sampling_slowdown: 0.01,
        writer_poll_timeout: Duration::from_millis(20),
        retry_backoff: Duration::from_millis(5),
        ..PipelineConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Start
// ---------------------------------------------------------------------------

#[tokio::test]
async fn start_without_sensors_fails() {
    let mut monitor = Monitor::new(Arc::new(MemoryStore::default()), fast_config());
    assert_matches!(monitor.start().await, Err(PipelineError::NoSensors));
    assert!(!monitor.is_running());
    assert!(monitor.stop().await.is_none());
}

#[tokio::test]
async fn misconfigured_sensor_fails_before_spawning() {
    let mut sensors = room();
    sensors.push(sensor(
        9,
        SensorType::Sound,
        Thresholds::new(Some(70.0), Some(50.0), None, None),
    ));
    let mut monitor = Monitor::new(Arc::new(MemoryStore::with_sensors(sensors)), fast_config());

    assert_matches!(
        monitor.start().await,
        Err(PipelineError::InvalidSensor { sensor_id: 9, .. })
    );
    assert!(!monitor.is_running());
}

#[tokio::test(start_paused = true)]
async fn start_and_stop_are_idempotent() {
    let mut monitor = Monitor::new(Arc::new(MemoryStore::with_sensors(room())), fast_config());
    monitor.start().await.unwrap();
    monitor.start().await.unwrap();
    assert_eq!(monitor.worker_states().len(), 4);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(monitor.writer_state(), Some(WriterState::Running));
    let enqueued_while_running = monitor.enqueued();
    assert!(enqueued_while_running >= 4);

    let report = monitor.stop().await.unwrap();
    assert!(report.enqueued >= enqueued_while_running);
    assert_eq!(monitor.enqueued(), 0);
    assert!(monitor.stop().await.is_none());
    assert!(monitor.writer_state().is_none());
}

#[tokio::test(start_paused = true)]
async fn start_resumes_from_last_persisted_value() {
    let mut sensors = room();
    sensors[0].last_reading = Some(28.0);
    let mut monitor = Monitor::new(Arc::new(MemoryStore::with_sensors(sensors)), fast_config());
    monitor.start().await.unwrap();
    // One sample per sensor, then asleep.
    tokio::time::sleep(Duration::from_millis(5)).await;
    let report = monitor.stop().await.unwrap();
    assert_eq!(report.enqueued, 4);

    let first = monitor.generator().last_value(1).unwrap();
    assert!((27.5..=28.5).contains(&first), "got {first}");
}

// ---------------------------------------------------------------------------
// Accounting
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn drain_persists_every_enqueued_reading() {
    let store = Arc::new(MemoryStore::with_sensors(room()));
    let mut monitor = Monitor::new(Arc::clone(&store), fast_config());
    monitor.start().await.unwrap();

    tokio::time::sleep(Duration::from_millis(500)).await;
    let report = monitor.stop().await.unwrap();

    assert!(report.enqueued > 0);
    assert_eq!(report.writer.received, report.enqueued);
    assert_eq!(report.writer.persisted, report.enqueued);
    assert_eq!(report.writer.discarded, 0);
    assert_eq!(report.writer.failed, 0);
    assert_eq!(store.persisted().len() as u64, report.enqueued);
}

#[tokio::test(start_paused = true)]
async fn alerts_match_non_normal_readings() {
    let store = Arc::new(MemoryStore::with_sensors(room()));
    let mut monitor = Monitor::new(Arc::clone(&store), fast_config());
    monitor.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    let report = monitor.stop().await.unwrap();

    let persisted = store.persisted();
    let non_normal = persisted
        .iter()
        .filter(|r| r.status != SensorStatus::Normal)
        .count() as u64;
    assert_eq!(report.writer.alerts, non_normal);
    assert!(persisted
        .iter()
        .filter(|r| r.sensor_id == 3)
        .all(|r| (0.0..=1.0).contains(&r.value)));
}

#[tokio::test(start_paused = true)]
async fn readings_keep_per_sensor_order() {
    let store = Arc::new(MemoryStore::with_sensors(room()));
    let mut monitor = Monitor::new(Arc::clone(&store), fast_config());
    monitor.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    monitor.stop().await.unwrap();

    let mut last_seen: HashMap<i64, Reading> = HashMap::new();
    for reading in store.persisted() {
        if let Some(prev) = last_seen.get(&reading.sensor_id) {
            assert!(reading.timestamp >= prev.timestamp);
        }
        last_seen.insert(reading.sensor_id, reading);
    }
    assert_eq!(last_seen.len(), 4);
    // Every sensor's final persisted value is the generator's last value.
    let generator = monitor.generator();
    for (id, reading) in &last_seen {
        assert_eq!(generator.last_value(*id), Some(reading.value));
    }
}

#[tokio::test(start_paused = true)]
async fn discard_counts_abandoned_backlog() {
    let store = Arc::new(MemoryStore {
        sensors: room(),
        write_delay: Duration::from_millis(50),
        ..Default::default()
    });
    let config = PipelineConfig {
        shutdown_policy: ShutdownPolicy::Discard,
        ..fast_config()
    };
    let mut monitor = Monitor::new(Arc::clone(&store), config);
    monitor.start().await.unwrap();

    tokio::time::sleep(Duration::from_millis(500)).await;
    let report = monitor.stop().await.unwrap();

    assert!(report.writer.discarded > 0, "{report:?}");
    assert_eq!(report.writer.received + report.writer.discarded, report.enqueued);
    assert_eq!(report.writer.persisted, report.writer.received);
    assert_eq!(store.persisted().len() as u64, report.writer.persisted);
}

// ---------------------------------------------------------------------------
// Failure policy
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn drop_policy_loses_failed_readings() {
    let store = Arc::new(MemoryStore {
        sensors: room(),
        failures: AtomicU32::new(3),
        ..Default::default()
    });
    let mut monitor = Monitor::new(Arc::clone(&store), fast_config());
    monitor.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    let report = monitor.stop().await.unwrap();

    assert_eq!(report.writer.failed, 3);
    assert_eq!(report.writer.persisted + 3, report.enqueued);
}

#[tokio::test(start_paused = true)]
async fn retry_policy_recovers_transient_failures() {
    let store = Arc::new(MemoryStore {
        sensors: room(),
        failures: AtomicU32::new(2),
        ..Default::default()
    });
    let config = PipelineConfig {
        persist_failure_policy: PersistFailurePolicy::Retry { max_attempts: 3 },
        ..fast_config()
    };
    let mut monitor = Monitor::new(Arc::clone(&store), config);
    monitor.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    let report = monitor.stop().await.unwrap();

    assert_eq!(report.writer.failed, 0);
    assert_eq!(report.writer.persisted, report.enqueued);
}

#[tokio::test(start_paused = true)]
async fn retries_keep_per_sensor_order() {
    // Two readings each fail twice before the third attempt lands.
    let store = Arc::new(MemoryStore {
        sensors: room(),
        failures: AtomicU32::new(4),
        ..Default::default()
    });
    let config = PipelineConfig {
        persist_failure_policy: PersistFailurePolicy::Retry { max_attempts: 3 },
        ..fast_config()
    };
    let mut monitor = Monitor::new(Arc::clone(&store), config);
    monitor.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    let report = monitor.stop().await.unwrap();

    assert_eq!(report.writer.failed, 0);
    assert_eq!(report.writer.persisted, report.enqueued);
    assert_eq!(store.failures.load(Ordering::SeqCst), 0);

    let mut last_seen: HashMap<i64, Reading> = HashMap::new();
    for reading in store.persisted() {
        if let Some(prev) = last_seen.get(&reading.sensor_id) {
            assert!(
                reading.timestamp >= prev.timestamp,
                "sensor {} persisted out of order",
                reading.sensor_id
            );
        }
        last_seen.insert(reading.sensor_id, reading);
    }
    assert_eq!(last_seen.len(), 4);
    let generator = monitor.generator();
    for (id, reading) in &last_seen {
        assert_eq!(generator.last_value(*id), Some(reading.value));
    }
}

// ---------------------------------------------------------------------------
// Liveness
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stop_does_not_wait_out_sampling_interval() {
    // Nominal 1 s intervals doubled: every worker is asleep when stop arrives.
    let config = PipelineConfig {
        sampling_slowdown: 2.0,
        writer_poll_timeout: Duration::from_millis(100),
        ..PipelineConfig::default()
    };
    let store = Arc::new(MemoryStore::with_sensors(room()));
    let mut monitor = Monitor::new(Arc::clone(&store), config);
    monitor.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let report = tokio::time::timeout(Duration::from_secs(1), monitor.stop())
        .await
        .expect("stop should not wait for the next sample")
        .unwrap();
    assert!(report.elapsed < Duration::from_secs(1));
    assert_eq!(report.writer.persisted, report.enqueued);
    assert!(!monitor.is_running());
}

#[tokio::test(start_paused = true)]
async fn dropping_a_running_monitor_cancels_its_tasks() {
    let store = Arc::new(MemoryStore::with_sensors(room()));
    let mut monitor = Monitor::new(Arc::clone(&store), fast_config());
    monitor.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    drop(monitor);

    // The writer holds the last other reference to the store.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(Arc::strong_count(&store), 1);
    assert!(!store.persisted().is_empty());
}

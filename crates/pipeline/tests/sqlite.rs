//! End-to-end run of the pipeline against SQLite.

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use serverroom_core::reading::Reading;
use serverroom_core::thresholds::SensorStatus;
use serverroom_db::repositories::{AlertRepo, MeasurementRepo, SensorRepo};
use serverroom_db::seed::seed_default_sensors;
use serverroom_pipeline::{Monitor, PipelineConfig, PipelineError, ReadingStore, SqliteStore, StoreError};
use sqlx::SqlitePool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_database_refuses_to_start(pool: SqlitePool) {
    let store = Arc::new(SqliteStore::new(pool));
    let mut monitor = Monitor::new(Arc::clone(&store), PipelineConfig::default());
    assert_matches!(monitor.start().await, Err(PipelineError::NoSensors));

    // Nothing was written while failing.
    assert_eq!(SensorRepo::count(store.pool()).await.unwrap(), 0);
    assert_eq!(MeasurementRepo::count(store.pool()).await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_sensor_maps_to_store_error(pool: SqlitePool) {
    let store = SqliteStore::new(pool);
    let reading = Reading {
        sensor_id: 404,
        value: 1.0,
        status: SensorStatus::Normal,
        timestamp: chrono::Utc::now(),
    };
    assert_matches!(store.persist(&reading).await, Err(StoreError::UnknownSensor(404)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn seeded_room_persists_all_readings(pool: SqlitePool) {
    seed_default_sensors(&pool).await.unwrap();

    let config = PipelineConfig {
        sampling_slowdown: 0.5,
        writer_poll_timeout: Duration::from_millis(20),
        retry_backoff: Duration::from_millis(10),
        ..PipelineConfig::default()
    };
    let mut monitor = Monitor::new(Arc::new(SqliteStore::new(pool.clone())), config);
    monitor.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    let report = monitor.stop().await.unwrap();

    assert_eq!(report.sensors, 10);
    assert_eq!(report.writer.failed, 0);
    assert_eq!(report.writer.persisted, report.enqueued);

    let measurements = MeasurementRepo::list_all(&pool).await.unwrap();
    let alerts = AlertRepo::list_all(&pool).await.unwrap();
    assert_eq!(measurements.len() as u64, report.enqueued);
    assert_eq!(alerts.len() as u64, report.writer.alerts);

    // Every non-normal measurement has exactly one matching alert.
    let non_normal: Vec<_> = measurements
        .iter()
        .filter(|m| m.status() != Some(SensorStatus::Normal))
        .collect();
    assert_eq!(non_normal.len(), alerts.len());
    for m in non_normal {
        let matching = alerts
            .iter()
            .filter(|a| a.sensor_id == m.sensor_id && a.timestamp == m.timestamp && a.value == m.value)
            .count();
        assert_eq!(matching, 1);
    }

    // Snapshots hold the last measurement of each sensor.
    for sensor in SensorRepo::list(&pool).await.unwrap() {
        let latest = MeasurementRepo::list_recent_for_sensor(&pool, sensor.id, 1)
            .await
            .unwrap();
        assert_eq!(sensor.last_reading, latest.first().map(|m| m.value));
    }
}

//! Bootstrap data for a fresh database: the default sensor set and an
//! optional synthetic history.

use chrono::{Duration, Utc};
use rand::Rng;
use serverroom_core::alert::{describe, AlertSeverity};
use serverroom_core::generator::round_within;
use serverroom_core::sensor::SensorType;
use serverroom_core::thresholds::{classify, Thresholds};
use serverroom_core::types::{SensorId, Timestamp};

use crate::models::alert::CreateAlert;
use crate::models::measurement::CreateMeasurement;
use crate::models::sensor::CreateSensor;
use crate::repositories::{AlertRepo, MeasurementRepo, SensorRepo};
use crate::DbPool;

/// Spacing of synthetic history points, in minutes.
pub const HISTORY_STEP_MINUTES: i64 = 5;

/// One sensor of each known type with its stock thresholds
/// `(min_warning, max_warning, min_critical, max_critical)`.
pub const DEFAULT_SENSORS: [(SensorType, [f64; 4]); 10] = [
    (SensorType::Temperature, [20.0, 30.0, 15.0, 35.0]),
    (SensorType::Humidity, [30.0, 70.0, 20.0, 80.0]),
    (SensorType::AirQuality, [500.0, 1000.0, 400.0, 1500.0]),
    (SensorType::Smoke, [20.0, 50.0, 0.0, 100.0]),
    (SensorType::Gas, [20.0, 50.0, 0.0, 100.0]),
    (SensorType::Motion, [0.0, 1.0, 0.0, 1.0]),
    (SensorType::Sound, [50.0, 70.0, 0.0, 100.0]),
    (SensorType::Tampering, [0.0, 1.0, 0.0, 1.0]),
    (SensorType::WaterLeak, [0.0, 1.0, 0.0, 1.0]),
    (SensorType::Light, [200.0, 800.0, 0.0, 1000.0]),
];

/// Insert [`DEFAULT_SENSORS`] when the `sensors` table is empty.
///
/// Returns the number of sensors inserted (0 if any sensor already existed).
pub async fn seed_default_sensors(pool: &DbPool) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sensors")
        .fetch_one(&mut *tx)
        .await?;
    if existing > 0 {
        tracing::debug!(existing, "Sensors already registered, skipping seed");
        return Ok(0);
    }

    for (sensor_type, [min_w, max_w, min_c, max_c]) in DEFAULT_SENSORS {
        let thresholds = Thresholds::new(Some(min_w), Some(max_w), Some(min_c), Some(max_c));
        SensorRepo::insert(&mut *tx, &CreateSensor::new(sensor_type, thresholds)).await?;
    }

    tx.commit().await?;
    tracing::info!(count = DEFAULT_SENSORS.len(), "Seeded default sensors");
    Ok(DEFAULT_SENSORS.len() as u64)
}

/// Backfill `days` of synthetic history for every registered sensor.
///
/// One measurement per sensor every [`HISTORY_STEP_MINUTES`], from `days` ago up to
/// now. Presence-style sensors (motion, tampering, water leak) get 0 or 1;
/// the rest are drawn uniformly across their critical range (falling back to
/// the warning range, then to the type's generation bounds). Non-normal
/// points get an alert with the usual description. Sensor snapshots are not
/// touched. Returns the number of measurements inserted.
pub async fn seed_history(pool: &DbPool, days: u32) -> Result<u64, sqlx::Error> {
    if days == 0 {
        return Ok(0);
    }

    let sensors = SensorRepo::list(pool).await?;
    let end = Utc::now();
    let start = end - Duration::days(i64::from(days));

    // Built up front: the thread-local rng must not live across an await.
    let points = {
        let mut rng = rand::rng();
        let mut points = Vec::new();
        for sensor in &sensors {
            let kind = sensor.kind();
            let thresholds = sensor.thresholds();
            for ts in history_timestamps(start, end) {
                points.push(synthetic_point(&mut rng, sensor.id, kind, &thresholds, ts));
            }
        }
        points
    };

    let mut tx = pool.begin().await?;
    let mut alerts = 0u64;
    for (measurement, alert) in &points {
        MeasurementRepo::insert(&mut *tx, measurement).await?;
        if let Some(alert) = alert {
            AlertRepo::insert(&mut *tx, alert).await?;
            alerts += 1;
        }
    }
    tx.commit().await?;

    tracing::info!(
        days,
        sensors = sensors.len(),
        measurements = points.len(),
        alerts,
        "Seeded historical data"
    );
    Ok(points.len() as u64)
}

fn history_timestamps(start: Timestamp, end: Timestamp) -> impl Iterator<Item = Timestamp> {
    let step = Duration::minutes(HISTORY_STEP_MINUTES);
    std::iter::successors(Some(start), move |ts| Some(*ts + step)).take_while(move |ts| *ts <= end)
}

fn synthetic_point<R: Rng>(
    rng: &mut R,
    sensor_id: SensorId,
    kind: SensorType,
    thresholds: &Thresholds,
    timestamp: Timestamp,
) -> (CreateMeasurement, Option<CreateAlert>) {
    let value = match kind {
        SensorType::Motion | SensorType::Tampering | SensorType::WaterLeak => {
            f64::from(rng.random_range(0..=1u8))
        }
        _ => {
            let (fallback_min, fallback_max) = kind.profile().effective_bounds(thresholds);
            let low = thresholds.min_critical.or(thresholds.min_warning).unwrap_or(fallback_min);
            let high = thresholds.max_critical.or(thresholds.max_warning).unwrap_or(fallback_max);
            let (low, high) = if low <= high { (low, high) } else { (high, low) };
            let raw = if low < high { rng.random_range(low..=high) } else { low };
            round_within(raw, low, high, kind.profile().precision)
        }
    };

    let status = classify(value, thresholds);
    let measurement = CreateMeasurement {
        sensor_id,
        value,
        status: status.code(),
        timestamp,
    };
    let alert = AlertSeverity::from_status(status).map(|severity| CreateAlert {
        sensor_id,
        value,
        severity,
        description: describe(kind, value),
        timestamp,
    });
    (measurement, alert)
}

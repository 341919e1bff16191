//! Atomic persistence of one pipeline reading.

use serverroom_core::alert::{describe, AlertSeverity};
use serverroom_core::reading::Reading;
use serverroom_core::sensor::SensorType;
use serverroom_core::types::DbId;
use sqlx::SqlitePool;

use crate::models::alert::CreateAlert;
use crate::models::measurement::CreateMeasurement;
use crate::repositories::{AlertRepo, MeasurementRepo, SensorRepo};

/// Ids written for one reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedReading {
    pub measurement_id: DbId,
    pub alert_id: Option<DbId>,
}

/// Writes a reading's snapshot, history row and alert together.
pub struct ReadingRepo;

impl ReadingRepo {
    /// Persist a reading in a single transaction.
    ///
    /// Updates the sensor's latest snapshot, appends a measurement and, for
    /// a non-normal status, appends an alert with a type-specific
    /// description. Either all rows are written or none are.
    pub async fn record(pool: &SqlitePool, reading: &Reading) -> Result<RecordedReading, sqlx::Error> {
        let mut tx = pool.begin().await?;

        SensorRepo::update_latest(
            &mut *tx,
            reading.sensor_id,
            reading.value,
            reading.status.code(),
            reading.timestamp,
        )
        .await?;

        let measurement_id = MeasurementRepo::insert(&mut *tx, &CreateMeasurement::from(reading)).await?;

        let alert_id = match AlertSeverity::from_status(reading.status) {
            Some(severity) => {
                let sensor_type = SensorRepo::type_of(&mut *tx, reading.sensor_id)
                    .await?
                    .ok_or(sqlx::Error::RowNotFound)?;
                let description = describe(SensorType::from_name(&sensor_type), reading.value);

                let alert = CreateAlert {
                    sensor_id: reading.sensor_id,
                    value: reading.value,
                    severity,
                    description,
                    timestamp: reading.timestamp,
                };
                Some(AlertRepo::insert(&mut *tx, &alert).await?)
            }
            None => None,
        };

        tx.commit().await?;

        Ok(RecordedReading {
            measurement_id,
            alert_id,
        })
    }
}

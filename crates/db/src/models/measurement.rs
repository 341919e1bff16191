//! Append-only measurement history.

use serde::Serialize;
use serverroom_core::reading::Reading;
use serverroom_core::thresholds::SensorStatus;
use serverroom_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row of the `measurements` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Measurement {
    pub id: DbId,
    pub sensor_id: DbId,
    pub value: f64,
    pub status: i16,
    pub timestamp: Timestamp,
}

impl Measurement {
    pub fn status(&self) -> Option<SensorStatus> {
        SensorStatus::from_code(i64::from(self.status))
    }
}

/// DTO for appending a measurement.
#[derive(Debug, Clone)]
pub struct CreateMeasurement {
    pub sensor_id: DbId,
    pub value: f64,
    pub status: i16,
    pub timestamp: Timestamp,
}

impl From<&Reading> for CreateMeasurement {
    fn from(reading: &Reading) -> Self {
        Self {
            sensor_id: reading.sensor_id,
            value: reading.value,
            status: reading.status.code(),
            timestamp: reading.timestamp,
        }
    }
}

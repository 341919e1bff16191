//! Sensor configuration and latest-reading snapshot.

use serde::{Deserialize, Serialize};
use serverroom_core::sensor::{SensorConfig, SensorType};
use serverroom_core::thresholds::{SensorStatus, Thresholds};
use serverroom_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row of the `sensors` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Sensor {
    pub id: DbId,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub sensor_type: String,
    pub last_reading: Option<f64>,
    pub status: i16,
    pub last_reading_time: Option<Timestamp>,
    pub min_warning: Option<f64>,
    pub max_warning: Option<f64>,
    pub min_critical: Option<f64>,
    pub max_critical: Option<f64>,
}

impl Sensor {
    pub fn kind(&self) -> SensorType {
        SensorType::from_name(&self.sensor_type)
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds::new(
            self.min_warning,
            self.max_warning,
            self.min_critical,
            self.max_critical,
        )
    }

    /// Decoded latest status; `None` if the stored code is unknown.
    pub fn last_status(&self) -> Option<SensorStatus> {
        SensorStatus::from_code(i64::from(self.status))
    }

    /// Generation config for this sensor with the given interval slowdown.
    pub fn to_config(&self, slowdown: f64) -> SensorConfig {
        SensorConfig::new(self.id, self.kind(), self.thresholds(), slowdown)
    }
}

/// DTO for registering a sensor.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSensor {
    pub sensor_type: String,
    pub min_warning: Option<f64>,
    pub max_warning: Option<f64>,
    pub min_critical: Option<f64>,
    pub max_critical: Option<f64>,
}

impl CreateSensor {
    pub fn new(sensor_type: SensorType, thresholds: Thresholds) -> Self {
        Self {
            sensor_type: sensor_type.as_str().to_string(),
            min_warning: thresholds.min_warning,
            max_warning: thresholds.max_warning,
            min_critical: thresholds.min_critical,
            max_critical: thresholds.max_critical,
        }
    }
}

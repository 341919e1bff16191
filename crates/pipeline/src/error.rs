use serverroom_core::types::SensorId;

use crate::store::StoreError;

/// Fatal pipeline errors, returned from configuration loading and
/// [`Monitor::start`](crate::lifecycle::Monitor::start).
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("No sensors registered")]
    NoSensors,

    #[error("Sensor {sensor_id} is misconfigured: {reason}")]
    InvalidSensor { sensor_id: SensorId, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

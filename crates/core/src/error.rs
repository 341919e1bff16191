use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Value generation failed for sensor {sensor_id}: {reason}")]
    Generation { sensor_id: DbId, reason: String },
}

//! Append-only threshold-violation alerts.

use serde::Serialize;
use serverroom_core::alert::AlertSeverity;
use serverroom_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row of the `alerts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Alert {
    pub id: DbId,
    pub sensor_id: DbId,
    pub value: f64,
    pub severity: String,
    pub description: String,
    pub timestamp: Timestamp,
}

impl Alert {
    pub fn severity(&self) -> Option<AlertSeverity> {
        AlertSeverity::from_name(&self.severity)
    }
}

/// Alert joined with its sensor's type, newest-first listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AlertWithSensor {
    pub id: DbId,
    pub sensor_id: DbId,
    pub sensor_type: String,
    pub value: f64,
    pub severity: String,
    pub description: String,
    pub timestamp: Timestamp,
}

/// DTO for appending an alert.
#[derive(Debug, Clone)]
pub struct CreateAlert {
    pub sensor_id: DbId,
    pub value: f64,
    pub severity: AlertSeverity,
    pub description: String,
    pub timestamp: Timestamp,
}

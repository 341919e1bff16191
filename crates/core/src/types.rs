/// All database primary keys are SQLite INTEGER (64-bit).
pub type DbId = i64;

/// Sensor identifiers are the `sensors.id` primary key.
pub type SensorId = DbId;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

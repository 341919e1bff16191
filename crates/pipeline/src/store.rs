//! Persistence seam used by the lifecycle controller and the writer.

use async_trait::async_trait;
use serverroom_core::reading::Reading;
use serverroom_core::types::SensorId;
use serverroom_db::models::sensor::Sensor;
use serverroom_db::repositories::{ReadingRepo, RecordedReading, SensorRepo};
use serverroom_db::DbPool;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Sensor {0} does not exist")]
    UnknownSensor(SensorId),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether trying the same write again could succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(self, StoreError::UnknownSensor(_))
    }
}

/// Source of sensor definitions and sink for readings.
#[async_trait]
pub trait ReadingStore: Send + Sync + 'static {
    /// Every registered sensor, ordered by id.
    async fn load_sensors(&self) -> Result<Vec<Sensor>, StoreError>;

    /// Persist one reading atomically (snapshot, history row, alert).
    async fn persist(&self, reading: &Reading) -> Result<RecordedReading, StoreError>;
}

/// [`ReadingStore`] backed by the SQLite repositories.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl ReadingStore for SqliteStore {
    async fn load_sensors(&self) -> Result<Vec<Sensor>, StoreError> {
        Ok(SensorRepo::list(&self.pool).await?)
    }

    async fn persist(&self, reading: &Reading) -> Result<RecordedReading, StoreError> {
        ReadingRepo::record(&self.pool, reading)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => StoreError::UnknownSensor(reading.sensor_id),
                other => StoreError::Database(other),
            })
    }
}

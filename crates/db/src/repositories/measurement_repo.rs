//! Repository for the `measurements` table (append-only history).

use serverroom_core::types::{DbId, Timestamp};
use sqlx::{SqliteConnection, SqlitePool};

use crate::models::measurement::{CreateMeasurement, Measurement};

const COLUMNS: &str = "id, sensor_id, value, status, timestamp";

/// Provides query operations for measurements.
pub struct MeasurementRepo;

impl MeasurementRepo {
    /// Append a measurement and return its id.
    pub async fn insert(
        conn: &mut SqliteConnection,
        input: &CreateMeasurement,
    ) -> Result<DbId, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO measurements (sensor_id, value, status, timestamp) VALUES (?, ?, ?, ?)",
        )
        .bind(input.sensor_id)
        .bind(input.value)
        .bind(input.status)
        .bind(input.timestamp)
        .execute(conn)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Most recent measurements for one sensor, newest first.
    pub async fn list_recent_for_sensor(
        pool: &SqlitePool,
        sensor_id: DbId,
        limit: i64,
    ) -> Result<Vec<Measurement>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM measurements WHERE sensor_id = ? ORDER BY id DESC LIMIT ?"
        );
        sqlx::query_as::<_, Measurement>(&query)
            .bind(sensor_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Measurements recorded at or after `since`, in insertion order.
    pub async fn list_since(
        pool: &SqlitePool,
        since: Timestamp,
    ) -> Result<Vec<Measurement>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM measurements WHERE timestamp >= ? ORDER BY id");
        sqlx::query_as::<_, Measurement>(&query)
            .bind(since)
            .fetch_all(pool)
            .await
    }

    /// Full history in insertion order.
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Measurement>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM measurements ORDER BY id");
        sqlx::query_as::<_, Measurement>(&query).fetch_all(pool).await
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM measurements")
            .fetch_one(pool)
            .await
    }
}

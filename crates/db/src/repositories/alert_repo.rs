//! Repository for the `alerts` table (append-only).

use serverroom_core::types::DbId;
use sqlx::{SqliteConnection, SqlitePool};

use crate::models::alert::{Alert, AlertWithSensor, CreateAlert};

const COLUMNS: &str = "id, sensor_id, value, severity, description, timestamp";

/// Provides query operations for alerts.
pub struct AlertRepo;

impl AlertRepo {
    /// Append an alert and return its id.
    pub async fn insert(conn: &mut SqliteConnection, input: &CreateAlert) -> Result<DbId, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO alerts (sensor_id, value, severity, description, timestamp) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(input.sensor_id)
        .bind(input.value)
        .bind(input.severity.as_str())
        .bind(&input.description)
        .bind(input.timestamp)
        .execute(conn)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Newest alerts, optionally for a single sensor, joined with the sensor type.
    pub async fn list_recent(
        pool: &SqlitePool,
        sensor_id: Option<DbId>,
        limit: i64,
    ) -> Result<Vec<AlertWithSensor>, sqlx::Error> {
        let query = "\
            SELECT a.id, a.sensor_id, s.type AS sensor_type, a.value, a.severity, \
                   a.description, a.timestamp \
            FROM alerts a \
            JOIN sensors s ON a.sensor_id = s.id \
            WHERE (? IS NULL OR a.sensor_id = ?) \
            ORDER BY a.timestamp DESC, a.id DESC \
            LIMIT ?";
        sqlx::query_as::<_, AlertWithSensor>(query)
            .bind(sensor_id)
            .bind(sensor_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Every alert in insertion order.
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Alert>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM alerts ORDER BY id");
        sqlx::query_as::<_, Alert>(&query).fetch_all(pool).await
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM alerts")
            .fetch_one(pool)
            .await
    }
}

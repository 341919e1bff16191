//! Repository for the `sensors` table.

use serverroom_core::types::{DbId, Timestamp};
use sqlx::{SqliteConnection, SqlitePool};

use crate::models::sensor::{CreateSensor, Sensor};

/// Column list for `sensors` SELECT queries.
const COLUMNS: &str = "\
    id, type, last_reading, status, last_reading_time, \
    min_warning, max_warning, min_critical, max_critical";

/// Provides query operations for sensors.
pub struct SensorRepo;

impl SensorRepo {
    /// Register a sensor and return its id.
    pub async fn insert(conn: &mut SqliteConnection, input: &CreateSensor) -> Result<DbId, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO sensors (type, min_warning, max_warning, min_critical, max_critical) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&input.sensor_type)
        .bind(input.min_warning)
        .bind(input.max_warning)
        .bind(input.min_critical)
        .bind(input.max_critical)
        .execute(conn)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// All sensors ordered by id.
    pub async fn list(pool: &SqlitePool) -> Result<Vec<Sensor>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sensors ORDER BY id");
        sqlx::query_as::<_, Sensor>(&query).fetch_all(pool).await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: DbId) -> Result<Option<Sensor>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sensors WHERE id = ?");
        sqlx::query_as::<_, Sensor>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM sensors")
            .fetch_one(pool)
            .await
    }

    /// Stored type name of a sensor, if it exists.
    pub async fn type_of(conn: &mut SqliteConnection, id: DbId) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT type FROM sensors WHERE id = ?")
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Overwrite the latest-reading snapshot of a sensor.
    ///
    /// Returns `RowNotFound` when no sensor has this id.
    pub async fn update_latest(
        conn: &mut SqliteConnection,
        id: DbId,
        value: f64,
        status: i16,
        timestamp: Timestamp,
    ) -> Result<(), sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sensors SET last_reading = ?, status = ?, last_reading_time = ? WHERE id = ?",
        )
        .bind(value)
        .bind(status)
        .bind(timestamp)
        .bind(id)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }
}

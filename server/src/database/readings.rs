use sqlx::SqlitePool;

use shared::types::{ReadingData, ReadingInfo};

use crate::database::utils::get_timestamp;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Reading {
    pub id: i64,
    pub device_id: i64,
    pub bpm: f64,
    pub spo2: f64,
    pub temp: f64,
    pub recorded_at: i64,
}

impl Reading {
    pub fn to_reading_info(&self) -> ReadingInfo {
        ReadingInfo {
            id: self.id,
            device_id: self.device_id,
            bpm: self.bpm,
            spo2: self.spo2,
            temp: self.temp,
            recorded_at: self.recorded_at,
        }
    }
}

/// Persist one reading. The device id comes from the verified device
/// identity, never from the request body.
pub async fn insert_reading(
    pool: &SqlitePool,
    device_id: i64,
    data: &ReadingData,
) -> sqlx::Result<i64> {
    let result = sqlx::query(
        "INSERT INTO sensor_readings (device_id, bpm, spo2, temp, recorded_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(device_id)
    .bind(data.bpm)
    .bind(data.spo2)
    .bind(data.temp)
    .bind(get_timestamp())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Readings for one device, newest first, capped.
pub async fn list_for_device(
    pool: &SqlitePool,
    device_id: i64,
    limit: i64,
) -> sqlx::Result<Vec<Reading>> {
    sqlx::query_as(
        "SELECT id, device_id, bpm, spo2, temp, recorded_at
         FROM sensor_readings
         WHERE device_id = ?
         ORDER BY recorded_at DESC, id DESC
         LIMIT ?",
    )
    .bind(device_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Delete one reading. The `device_id` filter scopes the statement to the
/// device the caller was already authorized for, so a reading id belonging
/// to another device deletes nothing.
pub async fn delete_reading(
    pool: &SqlitePool,
    device_id: i64,
    reading_id: i64,
) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM sensor_readings WHERE id = ? AND device_id = ?")
        .bind(reading_id)
        .bind(device_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

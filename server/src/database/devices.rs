use sqlx::SqlitePool;
use tracing::debug;

use shared::types::{DeviceInfo, DeviceUpdateData};

use crate::database::utils::get_timestamp;

/// Stored device row. `api_key` is the device's long-lived credential and
/// never leaves the database layer except at creation time.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Device {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub api_key: String,
    pub delay: i64,
    pub current_state: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Device {
    /// Public view without the key.
    pub fn to_device_info(&self) -> DeviceInfo {
        DeviceInfo {
            id: self.id,
            user_id: self.user_id,
            name: self.name.clone(),
            api_key: None,
            delay: self.delay,
            current_state: self.current_state.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const DEVICE_COLUMNS: &str =
    "id, user_id, name, api_key, delay, current_state, created_at, updated_at";

/// Register a device under a user and return the new row id.
pub async fn create_device(
    pool: &SqlitePool,
    user_id: i64,
    name: &str,
    delay: i64,
    api_key: &str,
) -> sqlx::Result<i64> {
    let now = get_timestamp();

    let result = sqlx::query(
        "INSERT INTO devices (user_id, name, api_key, delay, current_state, created_at, updated_at)
         VALUES (?, ?, ?, ?, 'inactive', ?, ?)",
    )
    .bind(user_id)
    .bind(name)
    .bind(api_key)
    .bind(delay)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    debug!("Created device '{}' (id {}) for user {}", name, id, user_id);
    Ok(id)
}

pub async fn get_device(pool: &SqlitePool, device_id: i64) -> sqlx::Result<Option<Device>> {
    sqlx::query_as(&format!(
        "SELECT {} FROM devices WHERE id = ?",
        DEVICE_COLUMNS
    ))
    .bind(device_id)
    .fetch_optional(pool)
    .await
}

/// Exact-match lookup on the credential column. The auth hot path.
pub async fn get_device_by_api_key(pool: &SqlitePool, api_key: &str) -> sqlx::Result<Option<Device>> {
    sqlx::query_as(&format!(
        "SELECT {} FROM devices WHERE api_key = ?",
        DEVICE_COLUMNS
    ))
    .bind(api_key)
    .fetch_optional(pool)
    .await
}

pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> sqlx::Result<Vec<Device>> {
    sqlx::query_as(&format!(
        "SELECT {} FROM devices WHERE user_id = ? ORDER BY id",
        DEVICE_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Every device regardless of owner. Admin listing only.
pub async fn list_all(pool: &SqlitePool) -> sqlx::Result<Vec<Device>> {
    sqlx::query_as(&format!("SELECT {} FROM devices ORDER BY id", DEVICE_COLUMNS))
        .fetch_all(pool)
        .await
}

/// Apply a partial device update. Absent fields keep their stored value.
pub async fn update_device(
    pool: &SqlitePool,
    device_id: i64,
    update: &DeviceUpdateData,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "UPDATE devices SET
            current_state = COALESCE(?, current_state),
            delay         = COALESCE(?, delay),
            updated_at    = ?
         WHERE id = ?",
    )
    .bind(&update.current_state)
    .bind(update.delay)
    .bind(get_timestamp())
    .bind(device_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_device(pool: &SqlitePool, device_id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM devices WHERE id = ?")
        .bind(device_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version.  Bump this whenever the schema changes and add a
/// corresponding migration arm in `run_migrations`.
const SCHEMA_VERSION: i64 = 2;

/// Initialize the database schema and run any pending migrations.
pub async fn create_tables(pool: &SqlitePool) -> sqlx::Result<()> {
    create_schema(pool).await?;
    run_migrations(pool).await?;
    Ok(())
}

/// Create all tables for a brand-new database (version 2 schema).
async fn create_schema(pool: &SqlitePool) -> sqlx::Result<()> {
    // Users table — `role` is 'user' or 'admin'; profile columns (v2) hold
    // the health-record fields the frontend edits.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            username        TEXT    NOT NULL UNIQUE,
            password_hash   TEXT    NOT NULL,
            email           TEXT    NOT NULL UNIQUE,
            role            TEXT    NOT NULL DEFAULT 'user',
            full_name       TEXT,
            date_of_birth   TEXT,
            medical_history TEXT,
            address         TEXT,
            province        TEXT,
            city            TEXT,
            postal_code     TEXT,
            created_at      INTEGER NOT NULL,
            updated_at      INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    // Devices table — `api_key` is the device credential, minted once at
    // creation and compared verbatim on every ingest request.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS devices (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id       INTEGER NOT NULL,
            name          TEXT    NOT NULL,
            api_key       TEXT    NOT NULL UNIQUE,
            delay         INTEGER NOT NULL DEFAULT 10,
            current_state TEXT    NOT NULL DEFAULT 'inactive',
            created_at    INTEGER NOT NULL,
            updated_at    INTEGER NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        )",
    )
    .execute(pool)
    .await?;

    // Sensor readings — ownership is transitive through the device row.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS sensor_readings (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            device_id   INTEGER NOT NULL,
            bpm         REAL    NOT NULL,
            spo2        REAL    NOT NULL,
            temp        REAL    NOT NULL,
            recorded_at INTEGER NOT NULL,
            FOREIGN KEY (device_id) REFERENCES devices(id) ON DELETE CASCADE
        )",
    )
    .execute(pool)
    .await?;

    // --- Indexes --------------------------------------------------------
    // The api_key point query is the device-auth hot path.
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_devices_api_key ON devices(api_key)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_devices_user ON devices(user_id)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_readings_device ON sensor_readings(device_id, recorded_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Walk the database forward one version at a time.
async fn run_migrations(pool: &SqlitePool) -> sqlx::Result<()> {
    let (mut version,): (i64,) = sqlx::query_as("PRAGMA user_version").fetch_one(pool).await?;

    // A fresh database created by `create_schema` is already current.
    if version == 0 {
        let (user_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;
        if user_count == 0 {
            set_version(pool, SCHEMA_VERSION).await?;
            return Ok(());
        }
        version = 1;
    }

    while version < SCHEMA_VERSION {
        match version {
            1 => migrate_v1_to_v2(pool).await?,
            v => {
                warn!("No migration registered for schema version {}", v);
                break;
            }
        }
        version += 1;
        set_version(pool, version).await?;
        info!("Migrated database schema to version {}", version);
    }

    Ok(())
}

/// v1 → v2: profile columns added to `users`.
async fn migrate_v1_to_v2(pool: &SqlitePool) -> sqlx::Result<()> {
    for column in [
        "full_name TEXT",
        "date_of_birth TEXT",
        "medical_history TEXT",
        "address TEXT",
        "province TEXT",
        "city TEXT",
        "postal_code TEXT",
    ] {
        let stmt = format!("ALTER TABLE users ADD COLUMN {}", column);
        if let Err(e) = sqlx::query(&stmt).execute(pool).await {
            // Re-running a partially applied migration is fine; an existing
            // column is the only expected failure.
            warn!("Skipping migration step '{}': {}", stmt, e);
        }
    }
    Ok(())
}

async fn set_version(pool: &SqlitePool, version: i64) -> sqlx::Result<()> {
    // PRAGMA does not support bound parameters.
    sqlx::query(&format!("PRAGMA user_version = {}", version))
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_database_lands_on_current_version() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        create_tables(&pool).await.unwrap();

        let (version,): (i64,) = sqlx::query_as("PRAGMA user_version")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn create_tables_is_idempotent() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        create_tables(&pool).await.unwrap();
        create_tables(&pool).await.unwrap();
    }
}

pub mod devices;
pub mod readings;
pub mod schema;
pub mod users;
pub mod utils;

/// In-memory database for tests. Pinned to a single connection — every
/// pooled connection to `sqlite::memory:` would otherwise get its own,
/// empty database.
#[cfg(test)]
pub(crate) async fn test_pool() -> sqlx::SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    schema::create_tables(&pool).await.expect("schema");
    pool
}

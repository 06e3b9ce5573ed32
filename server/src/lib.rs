pub mod auth;
pub mod database;
pub mod handlers;

use shared::config::LiveConfig;
use sqlx::SqlitePool;

use crate::auth::SessionVerifier;

/// Shared per-request context. Cheap to clone: the pool and config are
/// handles, the verifier holds two HMAC keys.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: LiveConfig,
    pub sessions: SessionVerifier,
}

impl AppState {
    pub fn new(db: SqlitePool, config: LiveConfig, sessions: SessionVerifier) -> Self {
        Self {
            db,
            config,
            sessions,
        }
    }
}

pub mod config;

pub use self::config::load_config;

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::types::server_config::AppConfig;

/// A cheaply-cloneable, live config handle.
///
/// All clones share the same underlying `RwLock<AppConfig>`, so a call to
/// [`reload`](LiveConfig::reload) is immediately visible to every part of
/// the application that holds a clone — including spawned tasks and
/// per-connection handlers.
///
/// The JWT secret is the one exception: it is copied out of the config once
/// at startup and a reload does not rotate it (see `AuthConfig.jwt_secret`).
#[derive(Clone, Debug)]
pub struct LiveConfig(Arc<RwLock<AppConfig>>);

impl LiveConfig {
    /// Wrap an `AppConfig` in a new `LiveConfig`.
    pub fn new(config: AppConfig) -> Self {
        Self(Arc::new(RwLock::new(config)))
    }

    /// Acquire a read guard. Keep it short-lived; never hold across `.await`.
    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, AppConfig> {
        self.0.read().await
    }

    /// Atomically swap in a new config. All existing clones see the new
    /// values on their next `.read()` call.
    pub async fn reload(&self, new: AppConfig) {
        *self.0.write().await = new;
    }
}

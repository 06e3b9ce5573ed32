use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// sqlx connection string, e.g. `sqlite://pulsewatch.db` or
    /// `sqlite::memory:` for throwaway runs.
    #[serde(default = "default_database_url")]
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    #[serde(default = "default_token_expiry")]
    pub token_expiry_minutes: u64,
    /// HMAC key used to sign and verify session JWTs.
    ///
    /// Prefer loading this via the `PULSEWATCH_JWT_SECRET` environment
    /// variable. This config field is the fallback for deployments that
    /// cannot inject env vars at runtime.
    ///
    /// **Minimum length:** 32 characters.
    /// **Hot-reload safe:** NO — the server reads this once at startup and
    /// stores it in `AppState`. Rotating it requires a restart because a
    /// new secret immediately invalidates every outstanding token.
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CorsConfig {
    /// Origin allowed to call the API from a browser. Empty disables CORS
    /// headers entirely (devices and server-to-server callers never need
    /// them).
    #[serde(default)]
    pub allowed_origin: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl ServerConfig {
    /// Full bind address, e.g. `"0.0.0.0:8080"`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl AuthConfig {
    /// Token expiry converted to seconds — convenience for the login
    /// response's `expires_in` field.
    pub fn token_expiry_secs(&self) -> u64 {
        self.token_expiry_minutes * 60
    }

    /// Resolve the JWT secret with the `PULSEWATCH_JWT_SECRET` env var
    /// taking priority over the config file field.
    ///
    /// Returns `None` when neither source is set (the server startup code
    /// treats this as a hard error).
    pub fn resolved_jwt_secret(&self) -> Option<String> {
        std::env::var("PULSEWATCH_JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| self.jwt_secret.clone())
            .filter(|s| !s.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Serde defaults
// ---------------------------------------------------------------------------

pub fn default_port() -> u16 {
    8080
}

pub fn default_max_connections() -> usize {
    1000
}

pub fn default_token_expiry() -> u64 {
    60
}

pub fn default_database_url() -> String {
    "sqlite://pulsewatch.db".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_parses_with_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [server]
            bind = "127.0.0.1"

            [auth]
            jwt_secret = "0123456789abcdef0123456789abcdef"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.server.addr(), "127.0.0.1:8080");
        assert_eq!(cfg.auth.token_expiry_minutes, 60);
        assert_eq!(cfg.database.url, "sqlite://pulsewatch.db");
        assert!(cfg.cors.allowed_origin.is_empty());
    }

    #[test]
    fn expiry_converts_to_seconds() {
        let auth = AuthConfig {
            token_expiry_minutes: 90,
            jwt_secret: None,
        };
        assert_eq!(auth.token_expiry_secs(), 5400);
    }
}

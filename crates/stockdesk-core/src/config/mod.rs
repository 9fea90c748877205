//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate, with environment-variable overrides. Each sub-module
//! represents one configuration section.

pub mod app;
pub mod auth;
pub mod cache;
pub mod database;
pub mod integration;
pub mod logging;
pub mod session;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::auth::AuthConfig;
pub use self::cache::{CacheConfig, MemoryCacheConfig, RedisCacheConfig};
pub use self::database::DatabaseConfig;
pub use self::integration::{GoogleSheetsConfig, IntegrationConfig};
pub use self::logging::LoggingConfig;
pub use self::session::SessionConfig;
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Prefix of environment variables that override file configuration.
pub const ENV_PREFIX: &str = "STOCKDESK";

/// Root application configuration.
///
/// Top-level deserialization target for the merged configuration
/// (`config/default.toml`, the environment overlay, then `STOCKDESK__*`
/// environment variables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Persistence settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Cache provider settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Token signing and password policy.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Refresh-cookie transport settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Background worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Third-party integration settings.
    #[serde(default)]
    pub integrations: IntegrationConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration for the named environment.
    ///
    /// Merges `config/default`, `config/{env}` and environment variables
    /// prefixed with `STOCKDESK__`, then validates the result.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.environment", env)?
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        self.auth.validate()?;
        self.database.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_token_lifetimes() {
        let config = AppConfig::default();
        assert_eq!(config.auth.access_token_ttl_minutes, 15);
        assert_eq!(config.auth.refresh_token_ttl_days, 7);
        assert_eq!(config.session.cookie_name, "refresh_token");
    }

    #[test]
    fn test_default_secrets_fail_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_distinct_secrets_pass_validation() {
        let mut config = AppConfig::default();
        config.auth.access_token_secret = "a".repeat(32);
        config.auth.refresh_token_secret = "b".repeat(32);
        assert!(config.validate().is_ok());
    }
}

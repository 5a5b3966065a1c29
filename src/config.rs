use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use tracing::info;
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_RESERVATION_EXPIRY_MINUTES: u32 = 30;
const MAX_RESERVATION_EXPIRY_MINUTES: u32 = 1440; // 24h
const DEFAULT_NEAR_EXPIRATION_DAYS: i64 = 7;

/// Application configuration structure with validation.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// Minutes until a reservation's advisory expiry hint, when the caller
    /// does not supply one (1 - 1440)
    #[serde(default = "default_reservation_expiry_minutes")]
    #[validate(range(min = 1, max = 1440))]
    pub reservation_expiry_minutes: u32,

    /// Days ahead of a lot's expiration date at which the near-expiration
    /// alert flag turns on
    #[serde(default = "default_near_expiration_days")]
    #[validate(range(min = 1, max = 365))]
    pub near_expiration_days: i64,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_reservation_expiry_minutes() -> u32 {
    DEFAULT_RESERVATION_EXPIRY_MINUTES
}

fn default_near_expiration_days() -> i64 {
    DEFAULT_NEAR_EXPIRATION_DAYS
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_min_connections() -> u32 {
    1
}

fn default_db_connect_timeout_secs() -> u64 {
    30
}

fn default_db_idle_timeout_secs() -> u64 {
    600
}

fn default_db_acquire_timeout_secs() -> u64 {
    8
}

impl AppConfig {
    /// Constructs a configuration directly, bypassing file/env loading.
    /// Used by tests and embedders that already hold their settings.
    pub fn new(database_url: String, environment: String) -> Self {
        Self {
            database_url,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            reservation_expiry_minutes: default_reservation_expiry_minutes(),
            near_expiration_days: default_near_expiration_days(),
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
        }
    }

    /// Loads configuration from layered sources, lowest priority first:
    /// `config/default.toml`, `config/<environment>.toml`, then environment
    /// variables prefixed with `FRESHLEDGER_`.
    pub fn load() -> Result<Self, ConfigError> {
        let environment = env::var("FRESHLEDGER_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

        let mut builder = Config::builder();

        let default_path = Path::new(CONFIG_DIR).join("default.toml");
        if default_path.exists() {
            builder = builder.add_source(File::from(default_path));
        }

        let env_path = Path::new(CONFIG_DIR).join(format!("{environment}.toml"));
        if env_path.exists() {
            builder = builder.add_source(File::from(env_path));
        }

        builder = builder.add_source(Environment::with_prefix("FRESHLEDGER").separator("__"));

        let config: AppConfig = builder.build()?.try_deserialize()?;

        config
            .validate()
            .map_err(|e| ConfigError::Message(format!("invalid configuration: {e}")))?;

        info!(
            environment = %config.environment,
            reservation_expiry_minutes = config.reservation_expiry_minutes,
            "configuration loaded"
        );

        Ok(config)
    }

    /// Clamps a caller-supplied reservation expiry to the allowed window,
    /// falling back to the configured default when absent.
    pub fn effective_expiry_minutes(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.reservation_expiry_minutes)
            .clamp(1, MAX_RESERVATION_EXPIRY_MINUTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_minutes_clamped_to_window() {
        let cfg = AppConfig::new("sqlite::memory:".into(), "test".into());
        assert_eq!(cfg.effective_expiry_minutes(None), 30);
        assert_eq!(cfg.effective_expiry_minutes(Some(90)), 90);
        assert_eq!(cfg.effective_expiry_minutes(Some(0)), 1);
        assert_eq!(cfg.effective_expiry_minutes(Some(100_000)), 1440);
    }

    #[test]
    fn defaults_validate() {
        let cfg = AppConfig::new("sqlite::memory:".into(), "test".into());
        assert!(cfg.validate().is_ok());
    }
}

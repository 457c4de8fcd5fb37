//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `cache` - Redis configuration backing the distributed rate limiter
//! - `database` - Database connection and pool configuration
//! - `environment` - Environment detection and logging configuration
//! - `rate_limit` - Request/reset throttling policy per credential
//! - `server` - HTTP server configuration
//!
//! The top-level [`AppConfig`] is assembled by the `config` crate from an
//! optional TOML file and `CREDVERIFY__*` environment overrides.

pub mod cache;
pub mod database;
pub mod environment;
pub mod rate_limit;
pub mod server;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub use cache::CacheConfig;
pub use database::DatabaseConfig;
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use rate_limit::RateLimitConfig;
pub use server::ServerConfig;

/// Environment variable prefix used for configuration overrides
pub const ENV_PREFIX: &str = "CREDVERIFY";

/// Environment variable naming the configuration file
pub const CONFIG_FILE_VAR: &str = "CREDVERIFY_CONFIG";

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Per-method validator settings
///
/// `config` is handed verbatim (as JSON) to the validator's `init`, which owns
/// its parsing and validation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ValidatorSettings {
    /// Whether this method is registered at startup
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Delivery provider ("mock", "twilio", "log")
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Identifier normalizer ("e164", "email")
    pub normalizer: String,

    /// Base URL of the page that accepts reset tokens
    #[serde(default)]
    pub reset_url: Option<String>,

    /// Method-specific configuration passed to `init`
    #[serde(default)]
    pub config: serde_json::Value,
}

impl ValidatorSettings {
    /// Create settings for a method with default provider
    pub fn new(normalizer: impl Into<String>) -> Self {
        Self {
            enabled: true,
            provider: default_provider(),
            normalizer: normalizer.into(),
            reset_url: None,
            config: serde_json::Value::Null,
        }
    }

    /// Serialize the method configuration for `init`
    pub fn config_json(&self) -> String {
        match &self.config {
            serde_json::Value::Null => "{}".to_string(),
            other => other.to_string(),
        }
    }
}

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    #[serde(default)]
    pub environment: Environment,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration; credentials are kept in memory when absent
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// Redis configuration; rate limits are kept in memory when absent
    #[serde(default)]
    pub cache: Option<CacheConfig>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Validators keyed by method tag ("tel", "email", ...)
    #[serde(default = "default_validators")]
    pub validators: HashMap<String, ValidatorSettings>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let env = Environment::default();
        Self {
            environment: env,
            server: ServerConfig::default(),
            database: None,
            cache: None,
            logging: LoggingConfig::for_environment(env),
            validators: default_validators(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `.env`, the optional config file and environment overrides
    ///
    /// The file is taken from `CREDVERIFY_CONFIG`, falling back to the
    /// environment-specific file name (e.g. `config.development.toml`).
    /// Nested keys are overridden with `CREDVERIFY__SECTION__KEY`.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let env = Environment::from_env();
        let file = std::env::var(CONFIG_FILE_VAR).unwrap_or_else(|_| env.config_file().to_string());

        let loaded: AppConfig = config::Config::builder()
            .set_default("environment", env.to_string())?
            .add_source(config::File::with_name(&file).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Parse configuration from a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let loaded: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Validate cross-section constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                message: "server.port must be non-zero".to_string(),
            });
        }

        for (method, settings) in &self.validators {
            if method.is_empty() || !method.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(ConfigError::Invalid {
                    message: format!("validator tag '{}' must be alphanumeric", method),
                });
            }
            if settings.normalizer.is_empty() {
                return Err(ConfigError::Invalid {
                    message: format!("validator '{}' has no normalizer", method),
                });
            }
        }

        Ok(())
    }

    /// Iterate over enabled validators
    pub fn enabled_validators(&self) -> impl Iterator<Item = (&String, &ValidatorSettings)> {
        self.validators.iter().filter(|(_, settings)| settings.enabled)
    }
}

fn default_enabled() -> bool {
    true
}

fn default_provider() -> String {
    String::from("mock")
}

fn default_validators() -> HashMap<String, ValidatorSettings> {
    let mut validators = HashMap::new();
    validators.insert("tel".to_string(), ValidatorSettings::new("e164"));
    validators
}

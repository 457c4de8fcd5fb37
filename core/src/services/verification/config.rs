//! Per-method configuration parsed by `init`

use cv_shared::RateLimitConfig;
use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};
use crate::services::token::{MAX_CODE_LENGTH, MIN_CODE_LENGTH};

/// Highest accepted chance of guessing a code within the attempt budget
pub const MAX_GUESS_PROBABILITY: f64 = 1e-3;

/// Configuration of one verification method
///
/// Parsed from the JSON document handed to `init`. Unknown keys are
/// rejected so that typos fail at startup rather than silently falling back
/// to defaults.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MethodConfig {
    /// Digits in a response code
    #[serde(default = "default_code_length")]
    pub code_length: usize,

    /// Seconds a pending token stays valid
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    /// Wrong responses that lock a pending record
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Whether a verified value may belong to one user only
    #[serde(default = "default_unique")]
    pub unique: bool,

    /// Accept any non-empty response (testing only)
    #[serde(default)]
    pub accept_any_response: bool,

    /// Upper bound on one sender call in milliseconds
    #[serde(default = "default_delivery_timeout_ms")]
    pub delivery_timeout_ms: u64,

    /// Pause before the single delivery retry in milliseconds
    #[serde(default = "default_delivery_retry_backoff_ms")]
    pub delivery_retry_backoff_ms: u64,

    /// Seconds a reset temp token is announced as valid
    #[serde(default = "default_reset_ttl_seconds")]
    pub reset_ttl_seconds: u64,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for MethodConfig {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
            ttl_seconds: default_ttl_seconds(),
            max_attempts: default_max_attempts(),
            unique: default_unique(),
            accept_any_response: false,
            delivery_timeout_ms: default_delivery_timeout_ms(),
            delivery_retry_backoff_ms: default_delivery_retry_backoff_ms(),
            reset_ttl_seconds: default_reset_ttl_seconds(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl MethodConfig {
    /// Parse and validate a JSON configuration document
    ///
    /// An empty document or `null` yields the defaults.
    pub fn from_json(jsonconf: &str) -> DomainResult<Self> {
        let trimmed = jsonconf.trim();
        let config: MethodConfig = if trimmed.is_empty() || trimmed == "null" {
            MethodConfig::default()
        } else {
            serde_json::from_str(trimmed).map_err(|e| DomainError::Configuration {
                message: format!("Malformed method configuration: {}", e),
            })?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DomainResult<()> {
        let invalid = |message: String| Err(DomainError::Configuration { message });

        if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&self.code_length) {
            return invalid(format!(
                "code_length must be between {} and {}",
                MIN_CODE_LENGTH, MAX_CODE_LENGTH
            ));
        }
        if self.ttl_seconds == 0 {
            return invalid("ttl_seconds must be positive".to_string());
        }
        if self.max_attempts == 0 {
            return invalid("max_attempts must be at least 1".to_string());
        }
        if self.delivery_timeout_ms == 0 {
            return invalid("delivery_timeout_ms must be positive".to_string());
        }
        if self.reset_ttl_seconds == 0 {
            return invalid("reset_ttl_seconds must be positive".to_string());
        }
        if self.guess_probability() > MAX_GUESS_PROBABILITY {
            return invalid(format!(
                "max_attempts {} is too high for {}-digit codes",
                self.max_attempts, self.code_length
            ));
        }
        if let Err(message) = self.rate_limit.validate() {
            return invalid(format!("rate_limit: {}", message));
        }
        Ok(())
    }

    /// Chance of guessing a code within the attempt budget
    pub fn guess_probability(&self) -> f64 {
        self.max_attempts as f64 / 10f64.powi(self.code_length as i32)
    }

    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ttl_seconds as i64)
    }

    pub fn reset_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.reset_ttl_seconds as i64)
    }

    pub fn delivery_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.delivery_timeout_ms)
    }

    pub fn delivery_retry_backoff(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.delivery_retry_backoff_ms)
    }
}

fn default_code_length() -> usize {
    6
}

fn default_ttl_seconds() -> u64 {
    300
}

fn default_max_attempts() -> u32 {
    5
}

fn default_unique() -> bool {
    true
}

fn default_delivery_timeout_ms() -> u64 {
    10_000
}

fn default_delivery_retry_backoff_ms() -> u64 {
    250
}

fn default_reset_ttl_seconds() -> u64 {
    900
}

//! Rate limiting configuration module

use serde::{Deserialize, Serialize};

/// Throttling policy applied to verification requests and reset messages
///
/// Every key (one per user, method and credential value) gets a sliding
/// window of `requests_per_window` deliveries per `window_seconds`, and two
/// consecutive deliveries must be at least `min_interval_seconds` apart.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Max deliveries per key within the window
    #[serde(default = "default_requests_per_window")]
    pub requests_per_window: u32,

    /// Sliding window length in seconds
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,

    /// Minimum spacing between two deliveries in seconds
    #[serde(default = "default_min_interval")]
    pub min_interval_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            requests_per_window: default_requests_per_window(),
            window_seconds: default_window_seconds(),
            min_interval_seconds: default_min_interval(),
        }
    }
}

impl RateLimitConfig {
    /// Create a development configuration (more lenient limits)
    pub fn development() -> Self {
        Self {
            enabled: true,
            requests_per_window: 10,
            min_interval_seconds: 5,
            ..Default::default()
        }
    }

    /// Create a production configuration (stricter limits)
    pub fn production() -> Self {
        Self::default()
    }

    /// A policy that never denies
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Check the policy is usable
    pub fn validate(&self) -> Result<(), String> {
        if !self.enabled {
            return Ok(());
        }
        if self.requests_per_window == 0 {
            return Err("requests_per_window must be at least 1".to_string());
        }
        if self.window_seconds == 0 {
            return Err("window_seconds must be at least 1".to_string());
        }
        if self.min_interval_seconds > self.window_seconds {
            return Err("min_interval_seconds cannot exceed window_seconds".to_string());
        }
        Ok(())
    }
}

fn default_enabled() -> bool {
    true
}

fn default_requests_per_window() -> u32 {
    5
}

fn default_window_seconds() -> u64 {
    3600 // 1 hour
}

fn default_min_interval() -> u64 {
    60 // 1 minute
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(RateLimitConfig::default().validate().is_ok());
        assert!(RateLimitConfig::development().validate().is_ok());
        assert!(RateLimitConfig::disabled().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_quota() {
        let config = RateLimitConfig {
            requests_per_window: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_spacing_longer_than_window() {
        let config = RateLimitConfig {
            window_seconds: 30,
            min_interval_seconds: 60,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: RateLimitConfig =
            serde_json::from_str(r#"{"requests_per_window": 2}"#).unwrap();
        assert_eq!(config.requests_per_window, 2);
        assert_eq!(config.window_seconds, 3600);
        assert!(config.enabled);
    }
}

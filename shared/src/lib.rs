//! Shared utilities and common types for the CredVerify server
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types and loading
//! - Error response structures and error codes
//! - Utility functions (identifier masking, phone helpers)
//! - Language preferences for outbound messages

pub mod config;
pub mod errors;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, CacheConfig, ConfigError, DatabaseConfig, Environment, LogFormat, LoggingConfig,
    RateLimitConfig, ServerConfig, ValidatorSettings,
};
pub use errors::{error_codes, ErrorResponse};
pub use types::Language;
pub use utils::{email, phone};

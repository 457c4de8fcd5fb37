//! # Infrastructure Layer
//!
//! Concrete implementations of the capabilities the verification engine is
//! written against:
//!
//! - **Database**: MySQL credential store using SQLx
//! - **Cache**: Redis sliding-window rate limiter
//! - **SMS**: SMS providers (Twilio, mock) behind the [`sms::SmsService`] trait
//! - **Sender**: message rendering and delivery for confirmation and reset
//! - **Normalizer**: canonical forms for phone numbers and email addresses
//! - **Bootstrap**: assembles the validator registry from `AppConfig`
//!
//! ## Features
//!
//! - `mysql`: Enable MySQL database support (default)
//! - `redis-cache`: Enable Redis rate limiting (default)
//! - `twilio-sms`: Enable Twilio SMS service (default)

pub mod bootstrap;

/// Cache module - Redis client and rate limiter
#[cfg(feature = "redis-cache")]
pub mod cache;

/// Database module - MySQL implementations using SQLx
#[cfg(feature = "mysql")]
pub mod database;

pub mod normalizer;
pub mod sender;

/// SMS service module - External SMS providers
pub mod sms;

pub use bootstrap::build_registry;

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// SMS service error
    #[error("SMS service error: {0}")]
    Sms(String),

    /// The provider refused the destination; resending will not help
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    /// General infrastructure error
    #[error("Infrastructure error: {0}")]
    General(String),
}

//! Rate limiter trait and decision types

use async_trait::async_trait;
use cv_shared::RateLimitConfig;
use sha2::{Digest, Sha256};

use crate::domain::value_objects::UserId;
use crate::errors::DomainResult;

/// Why a permit was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// The previous delivery was too recent
    Spacing,
    /// The window quota is used up
    Quota,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::Spacing => "spacing",
            DenialReason::Quota => "quota",
        }
    }
}

/// Outcome of a permit request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { remaining: u32 },
    Denied {
        retry_after_seconds: u64,
        reason: DenialReason,
    },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }
}

/// Per-key delivery throttle
///
/// Implementations must make `try_acquire` atomic per key: the check and the
/// recording of the permit happen as one step.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Take one permit for `key` under `policy`
    ///
    /// When `enforce_spacing` is false only the window quota applies; the
    /// engine passes false when re-sending a token whose delivery was never
    /// confirmed.
    async fn try_acquire(
        &self,
        key: &str,
        policy: &RateLimitConfig,
        enforce_spacing: bool,
    ) -> DomainResult<RateLimitDecision>;

    /// Forget all permits recorded for `key`
    async fn reset(&self, key: &str) -> DomainResult<()>;
}

/// Short digest so credential values never appear in limiter keys
fn value_digest(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    hex::encode(&digest[..8])
}

/// Key throttling confirmation requests of one user for one value
pub fn request_key(method: &str, user: &UserId, value: &str) -> String {
    format!("request:{}:{}:{}", method, user, value_digest(value))
}

/// Key throttling reset messages sent to one value
pub fn reset_key(method: &str, value: &str) -> String {
    format!("reset:{}:{}", method, value_digest(value))
}

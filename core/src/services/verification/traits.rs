//! Capabilities the engine calls out to: delivery and normalization

use async_trait::async_trait;
use cv_shared::Language;
use thiserror::Error;

use crate::errors::VerificationError;

use super::types::DeliveryPayload;

/// Failure reported by a sender
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// Transient failure; the engine retries once after a backoff
    #[error("Retryable delivery failure: {0}")]
    Retryable(String),

    /// Permanent failure such as an unreachable destination
    #[error("Fatal delivery failure: {0}")]
    Fatal(String),
}

/// Out-of-band delivery channel (SMS gateway, voice call, email transport)
#[async_trait]
pub trait Sender: Send + Sync {
    /// Deliver a confirmation or reset message
    ///
    /// # Returns
    /// * `Ok(String)` - Provider message id
    /// * `Err(DeliveryError)` - Classified delivery failure
    async fn deliver(
        &self,
        destination: &str,
        payload: &DeliveryPayload,
        lang: Language,
    ) -> Result<String, DeliveryError>;
}

/// Canonicalizes raw credential values for one method
pub trait Normalizer: Send + Sync {
    /// Canonical form of `raw`, or `InvalidFormat`
    fn normalize(&self, raw: &str) -> Result<String, VerificationError>;
}

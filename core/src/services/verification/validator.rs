//! The capability interface every verification method implements

use async_trait::async_trait;
use cv_shared::Language;

use crate::domain::value_objects::UserId;
use crate::errors::DomainResult;

use super::types::{CheckOutcome, RequestOutcome, RequestParams, ResetDispatch};

/// A configured verification method such as `tel` or `email`
///
/// The outer credential-management layer looks validators up by tag in the
/// [`ValidatorRegistry`](super::ValidatorRegistry) and calls these operations;
/// a validator never dispatches to another method itself.
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    /// Tag this validator is registered under
    fn method(&self) -> &str;

    /// Parse method configuration; at most once per instance
    fn init(&self, jsonconf: &str) -> DomainResult<()>;

    fn is_initialized(&self) -> bool;

    /// Validate a value without touching any record
    ///
    /// # Returns
    /// * `Ok(String)` - Canonical form of the value
    /// * `Err(_)` - `InvalidFormat` or `AlreadyClaimed`
    async fn pre_check(
        &self,
        user: &UserId,
        value: &str,
        params: &serde_json::Value,
    ) -> DomainResult<String>;

    /// Issue and deliver a confirmation token for (user, value)
    async fn request(
        &self,
        user: &UserId,
        value: &str,
        params: RequestParams,
    ) -> DomainResult<RequestOutcome>;

    /// Check the user's response against the most recent pending token
    async fn check(&self, user: &UserId, response: &str) -> DomainResult<CheckOutcome>;

    /// Send secret-reset instructions to a verified value
    async fn reset_secret(
        &self,
        value: &str,
        scheme: &str,
        lang: Language,
        temp_token: &[u8],
    ) -> DomainResult<ResetDispatch>;

    /// Remove every record of the user under this method
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of records removed, zero when none existed
    async fn delete(&self, user: &UserId) -> DomainResult<usize>;
}

//! Verification engine: the per-method credential state machine
//!
//! One engine serves one method tag. It owns no mutable state of its own
//! besides the init-once configuration and the in-process request locks;
//! records live in the [`CredentialStore`] and throttling state in the
//! [`RateLimiter`], both of which are atomic per key.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cv_shared::email::mask_credential;
use cv_shared::Language;
use once_cell::sync::OnceCell;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::entities::{CredentialRecord, CredentialState};
use crate::domain::value_objects::{CredentialKey, UserId};
use crate::errors::{DomainError, DomainResult, VerificationError};
use crate::repositories::{CredentialStore, StoreError, WriteGuard};
use crate::services::rate_limit::{request_key, reset_key, RateLimitDecision, RateLimiter};
use crate::services::token::TokenGenerator;

use super::config::MethodConfig;
use super::locks::KeyedLocks;
use super::traits::{DeliveryError, Normalizer, Sender};
use super::types::{
    CheckOutcome, DeliveryPayload, DeliveryPurpose, RequestOutcome, RequestParams, ResetDispatch,
};
use super::validator::CredentialValidator;

/// Compare-and-swap rounds before giving up on a contended record
const MAX_COMMIT_ATTEMPTS: usize = 4;

/// Sender calls per delivery: the first try plus one retry
const DELIVERY_ATTEMPTS: usize = 2;

/// Pause before retrying a transient store failure
const STORE_RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// Credential verification engine for one method
pub struct VerificationEngine<S: CredentialStore + ?Sized, R: RateLimiter + ?Sized> {
    method: String,
    store: Arc<S>,
    limiter: Arc<R>,
    sender: Arc<dyn Sender>,
    normalizer: Arc<dyn Normalizer>,
    config: OnceCell<MethodConfig>,
    locks: KeyedLocks,
}

impl<S: CredentialStore + ?Sized, R: RateLimiter + ?Sized> VerificationEngine<S, R> {
    /// Create an engine for `method`; `init` must be called before use
    ///
    /// # Arguments
    ///
    /// * `method` - Tag the engine serves, e.g. `tel`
    /// * `store` - Credential table accessor
    /// * `limiter` - Delivery throttle
    /// * `sender` - Out-of-band delivery channel
    /// * `normalizer` - Canonicalizer for raw credential values
    pub fn new(
        method: impl Into<String>,
        store: Arc<S>,
        limiter: Arc<R>,
        sender: Arc<dyn Sender>,
        normalizer: Arc<dyn Normalizer>,
    ) -> Self {
        Self {
            method: method.into(),
            store,
            limiter,
            sender,
            normalizer,
            config: OnceCell::new(),
            locks: KeyedLocks::new(),
        }
    }

    /// The configuration set by `init`
    pub fn config(&self) -> DomainResult<&MethodConfig> {
        self.config
            .get()
            .ok_or_else(|| VerificationError::NotInitialized.into())
    }

    fn normalize(&self, raw: &str) -> DomainResult<String> {
        self.normalizer.normalize(raw).map_err(DomainError::from)
    }

    fn key(&self, user: &UserId, value: &str) -> CredentialKey {
        CredentialKey::new(user.clone(), self.method.clone(), value.to_string())
    }

    /// Run a store call, retrying once after a transient failure
    async fn with_store_retry<T, F, Fut>(&self, operation: &'static str, f: F) -> Result<T, StoreError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        match f().await {
            Err(StoreError::Unavailable { message }) => {
                tracing::warn!(
                    method = %self.method,
                    operation = operation,
                    error = %message,
                    event = "store_retry",
                    "Credential store unavailable, retrying once"
                );
                tokio::time::sleep(STORE_RETRY_BACKOFF).await;
                f().await
            }
            other => other,
        }
    }

    async fn find(&self, key: &CredentialKey) -> DomainResult<Option<CredentialRecord>> {
        Ok(self
            .with_store_retry("find", || self.store.find(key))
            .await?)
    }

    /// Fails with `AlreadyClaimed` when another user verified `value`
    async fn ensure_unclaimed(
        &self,
        config: &MethodConfig,
        user: &UserId,
        value: &str,
    ) -> DomainResult<()> {
        if !config.unique {
            return Ok(());
        }
        let owner = self
            .with_store_retry("find_verified_by_value", || {
                self.store.find_verified_by_value(&self.method, value)
            })
            .await?;
        match owner {
            Some(record) if &record.user != user => {
                tracing::info!(
                    method = %self.method,
                    value = %mask_credential(value),
                    event = "credential_already_claimed",
                    "Credential value is verified by another user"
                );
                Err(VerificationError::AlreadyClaimed.into())
            }
            _ => Ok(()),
        }
    }

    /// Refuse to re-arm a verified record unless re-verification was asked for
    fn ensure_requestable(prior: Option<&CredentialRecord>, reverify: bool) -> DomainResult<()> {
        match prior {
            Some(record) if record.state == CredentialState::Verified && !reverify => {
                Err(VerificationError::AlreadyVerified.into())
            }
            _ => Ok(()),
        }
    }

    async fn acquire_permit(
        &self,
        key: &str,
        policy: &cv_shared::RateLimitConfig,
        enforce_spacing: bool,
        value: &str,
    ) -> DomainResult<()> {
        match self.limiter.try_acquire(key, policy, enforce_spacing).await? {
            RateLimitDecision::Allowed { .. } => Ok(()),
            RateLimitDecision::Denied {
                retry_after_seconds,
                reason,
            } => {
                tracing::warn!(
                    method = %self.method,
                    value = %mask_credential(value),
                    reason = reason.as_str(),
                    retry_after_seconds = retry_after_seconds,
                    event = "rate_limit_exceeded",
                    "Delivery rate limit exceeded"
                );
                Err(VerificationError::RateLimited {
                    retry_after_seconds,
                }
                .into())
            }
        }
    }

    /// Digests of the user's other live pending codes under this method
    async fn sibling_hashes(&self, key: &CredentialKey) -> DomainResult<Vec<String>> {
        let now = Utc::now();
        let records = self
            .with_store_retry("find_by_user", || {
                self.store.find_by_user(&key.user, &self.method)
            })
            .await?;
        Ok(records
            .into_iter()
            .filter(|r| r.value != key.value && r.is_live_pending(now))
            .filter_map(|r| r.secret_hash)
            .collect())
    }

    /// Call the sender under a timeout, retrying a transient failure once
    async fn deliver(
        &self,
        config: &MethodConfig,
        destination: &str,
        payload: &DeliveryPayload,
        lang: Language,
    ) -> Result<String, VerificationError> {
        let mut last_reason = String::new();

        for attempt in 1..=DELIVERY_ATTEMPTS {
            let sent = tokio::time::timeout(
                config.delivery_timeout(),
                self.sender.deliver(destination, payload, lang),
            )
            .await;

            match sent {
                Ok(Ok(message_id)) => return Ok(message_id),
                Ok(Err(DeliveryError::Fatal(reason))) => {
                    tracing::error!(
                        method = %self.method,
                        destination = %mask_credential(destination),
                        error = %reason,
                        event = "delivery_failed",
                        "Sender rejected the message"
                    );
                    return Err(VerificationError::DeliveryFailed { reason });
                }
                Ok(Err(DeliveryError::Retryable(reason))) => last_reason = reason,
                Err(_) => {
                    last_reason = format!("timed out after {}ms", config.delivery_timeout_ms)
                }
            }

            if attempt < DELIVERY_ATTEMPTS {
                tracing::warn!(
                    method = %self.method,
                    destination = %mask_credential(destination),
                    attempt = attempt,
                    error = %last_reason,
                    event = "delivery_retry",
                    "Transient delivery failure, retrying"
                );
                tokio::time::sleep(config.delivery_retry_backoff()).await;
            }
        }

        tracing::error!(
            method = %self.method,
            destination = %mask_credential(destination),
            error = %last_reason,
            event = "delivery_failed",
            "Delivery failed after retry"
        );
        Err(VerificationError::DeliveryFailed {
            reason: last_reason,
        })
    }

    /// Put back the record a failed delivery replaced
    async fn roll_back(
        &self,
        key: &CredentialKey,
        prior: Option<&CredentialRecord>,
        committed_revision: u64,
    ) {
        let guard = WriteGuard::Revision(committed_revision);
        let result = match prior {
            Some(record) => self
                .with_store_retry("upsert", || self.store.upsert(record, guard))
                .await
                .map(|_| ()),
            None => self
                .with_store_retry("delete", || self.store.delete(key, guard))
                .await
                .map(|_| ()),
        };

        match result {
            Ok(()) => tracing::info!(
                method = %self.method,
                value = %mask_credential(&key.value),
                event = "request_rolled_back",
                "Restored credential record after failed delivery"
            ),
            // A newer request or check already moved the record on
            Err(StoreError::Conflict) => {}
            Err(StoreError::Claimed) => tracing::warn!(
                method = %self.method,
                value = %mask_credential(&key.value),
                event = "rollback_failed",
                "Verified record not restored; another user now holds the value"
            ),
            Err(StoreError::Unavailable { message }) => tracing::error!(
                method = %self.method,
                value = %mask_credential(&key.value),
                error = %message,
                event = "rollback_failed",
                "Could not restore credential record; it stays resend-eligible"
            ),
        }
    }

    fn response_matches(&self, config: &MethodConfig, record: &CredentialRecord, response: &str) -> bool {
        if config.accept_any_response {
            tracing::warn!(
                method = %self.method,
                event = "response_accepted_unchecked",
                "accept_any_response is enabled; response not compared"
            );
            return !response.trim().is_empty();
        }
        match record.secret_hash.as_deref() {
            Some(secret_hash) => TokenGenerator::verify(response, secret_hash),
            None => false,
        }
    }

    /// Check `response` against `record`, committing with compare-and-swap
    ///
    /// On a lost race the record is re-read; if it now holds a different
    /// token generation the check aborts with `NotFound`.
    async fn check_record(
        &self,
        config: &MethodConfig,
        record: CredentialRecord,
        response: &str,
    ) -> DomainResult<CheckOutcome> {
        let key = record.key();
        let token_id = record.token_id;
        let mut current = record;

        for _ in 0..MAX_COMMIT_ATTEMPTS {
            let now = Utc::now();

            match current.state {
                CredentialState::Failed => {
                    return Err(VerificationError::MaxAttemptsExceeded.into())
                }
                CredentialState::Pending if current.token_id == token_id => {}
                _ => return Err(VerificationError::NotFound.into()),
            }

            if current.is_expired_at(now) {
                let mut expired = current.clone();
                expired.expire(now);
                match self
                    .with_store_retry("upsert", || {
                        self.store.upsert(&expired, WriteGuard::Revision(current.revision))
                    })
                    .await
                {
                    Ok(_) | Err(StoreError::Conflict) => {}
                    Err(err) => return Err(err.into()),
                }
                tracing::info!(
                    method = %self.method,
                    value = %mask_credential(&current.value),
                    event = "confirmation_expired",
                    "Pending confirmation expired"
                );
                return Err(VerificationError::Expired.into());
            }

            let mut next = current.clone();
            let outcome: DomainResult<CheckOutcome> =
                if self.response_matches(config, &current, response) {
                    self.ensure_unclaimed(config, &current.user, &current.value)
                        .await?;
                    next.mark_verified(config.unique, now);
                    Ok(CheckOutcome {
                        value: next.value.clone(),
                        verified_at: now,
                    })
                } else if next.record_failure(config.max_attempts, now) {
                    Err(VerificationError::MaxAttemptsExceeded.into())
                } else {
                    Err(VerificationError::InvalidResponse {
                        remaining_attempts: next.remaining_attempts(config.max_attempts),
                    }
                    .into())
                };

            let revision = current.revision;
            let committed = self
                .with_store_retry("upsert", || {
                    self.store.upsert(&next, WriteGuard::Revision(revision))
                })
                .await;
            match committed {
                Ok(_) => {
                    self.log_check(&next, &outcome);
                    return outcome;
                }
                Err(StoreError::Conflict) => {
                    current = self
                        .find(&key)
                        .await?
                        .ok_or(VerificationError::NotFound)?;
                }
                // Another user's check committed first
                Err(StoreError::Claimed) => {
                    tracing::info!(
                        method = %self.method,
                        user = %current.user,
                        value = %mask_credential(&current.value),
                        event = "credential_already_claimed",
                        "Credential value was verified by another user first"
                    );
                    return Err(VerificationError::AlreadyClaimed.into());
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(DomainError::Internal {
            message: "Credential record is under heavy contention".to_string(),
        })
    }

    fn log_check(&self, record: &CredentialRecord, outcome: &DomainResult<CheckOutcome>) {
        let value = mask_credential(&record.value);
        match outcome {
            Ok(_) => tracing::info!(
                method = %self.method,
                user = %record.user,
                value = %value,
                event = "credential_verified",
                "Credential verified"
            ),
            Err(DomainError::Verification(VerificationError::MaxAttemptsExceeded)) => {
                tracing::warn!(
                    method = %self.method,
                    user = %record.user,
                    value = %value,
                    event = "max_attempts_exceeded",
                    "Credential locked after too many wrong responses"
                )
            }
            Err(_) => tracing::warn!(
                method = %self.method,
                user = %record.user,
                value = %value,
                retry_count = record.retry_count,
                event = "confirmation_failed",
                "Wrong confirmation response"
            ),
        }
    }

    /// Stamp the delivery onto the pending record it was issued for
    ///
    /// A concurrent wrong check may bump the revision in between; the stamp
    /// is re-applied as long as the record still holds the same token.
    async fn confirm_delivery(
        &self,
        mut record: CredentialRecord,
        message_id: &str,
    ) -> DomainResult<()> {
        let key = record.key();
        let token_id = record.token_id;

        for _ in 0..MAX_COMMIT_ATTEMPTS {
            record.mark_delivered(message_id.to_string(), Utc::now());
            let revision = record.revision;
            let committed = self
                .with_store_retry("upsert", || {
                    self.store.upsert(&record, WriteGuard::Revision(revision))
                })
                .await;
            match committed {
                Ok(_) => return Ok(()),
                Err(StoreError::Conflict) => match self.find(&key).await? {
                    Some(current)
                        if current.state == CredentialState::Pending
                            && current.token_id == token_id
                            && current.delivered_at.is_none() =>
                    {
                        record = current;
                    }
                    // The token was consumed or superseded
                    _ => return Ok(()),
                },
                Err(err) => return Err(err.into()),
            }
        }

        tracing::warn!(
            method = %self.method,
            value = %mask_credential(&key.value),
            event = "delivery_unconfirmed",
            "Delivery could not be recorded; the token stays resend-eligible"
        );
        Ok(())
    }

    /// Issue a new token for `key`, commit it as Pending, deliver, confirm
    async fn issue_and_deliver(
        &self,
        config: &MethodConfig,
        key: &CredentialKey,
        mut prior: Option<CredentialRecord>,
        params: RequestParams,
    ) -> DomainResult<RequestOutcome> {
        let generator = TokenGenerator::new(config.code_length)?;
        let avoid = self.sibling_hashes(key).await?;

        // Commit the pending record before delivery so a crash leaves a
        // resend-eligible record rather than a token nobody stored.
        let mut attempt = 0;
        let (pending, issued, revision) = loop {
            attempt += 1;
            Self::ensure_requestable(prior.as_ref(), params.reverify)?;

            let issued = generator.issue(params.temp_token.clone(), &avoid)?;
            let now = Utc::now();
            let mut pending = prior.clone().unwrap_or_else(|| {
                CredentialRecord::new(key.user.clone(), self.method.clone(), key.value.clone())
            });
            pending.arm(
                issued.secret_hash.clone(),
                issued.token_id,
                issued.temp_token.clone(),
                config.ttl(),
                now,
            );

            let guard = WriteGuard::for_read(prior.as_ref());
            let committed = self
                .with_store_retry("upsert", || self.store.upsert(&pending, guard))
                .await;
            match committed {
                Ok(revision) => break (pending, issued, revision),
                Err(StoreError::Conflict) if attempt < MAX_COMMIT_ATTEMPTS => {
                    prior = self.find(key).await?;
                }
                Err(StoreError::Conflict) => {
                    return Err(DomainError::Internal {
                        message: "Credential record is under heavy contention".to_string(),
                    })
                }
                Err(err) => return Err(err.into()),
            }
        };

        let expires_at = pending.expires_at.unwrap_or_else(Utc::now);
        let payload = DeliveryPayload {
            purpose: DeliveryPurpose::Confirmation,
            method: self.method.clone(),
            code: Some(issued.code),
            temp_token: issued.temp_token,
            expires_at,
        };

        let message_id = match self.deliver(config, &key.value, &payload, params.lang).await {
            Ok(message_id) => message_id,
            Err(err) => {
                self.roll_back(key, prior.as_ref(), revision).await;
                return Err(err.into());
            }
        };

        let mut delivered = pending;
        delivered.revision = revision;
        self.confirm_delivery(delivered, &message_id).await?;

        tracing::info!(
            method = %self.method,
            user = %key.user,
            value = %mask_credential(&key.value),
            message_id = %message_id,
            token_id = %issued.token_id,
            event = "confirmation_sent",
            "Confirmation token delivered"
        );

        Ok(RequestOutcome::Sent {
            expires_at,
            message_id,
            next_request_at: next_request_at(config, Utc::now()),
        })
    }
}

fn next_request_at(config: &MethodConfig, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if config.rate_limit.enabled {
        Some(now + chrono::Duration::seconds(config.rate_limit.min_interval_seconds as i64))
    } else {
        None
    }
}

#[async_trait]
impl<S, R> CredentialValidator for VerificationEngine<S, R>
where
    S: CredentialStore + ?Sized,
    R: RateLimiter + ?Sized,
{
    fn method(&self) -> &str {
        &self.method
    }

    fn init(&self, jsonconf: &str) -> DomainResult<()> {
        if self.config.get().is_some() {
            return Err(VerificationError::AlreadyInitialized.into());
        }

        let config = MethodConfig::from_json(jsonconf)?;
        if config.accept_any_response {
            tracing::warn!(
                method = %self.method,
                event = "accept_any_response_enabled",
                "Validator accepts any response; use for testing only"
            );
        }

        let (code_length, ttl_seconds, max_attempts, unique) = (
            config.code_length,
            config.ttl_seconds,
            config.max_attempts,
            config.unique,
        );
        self.config
            .set(config)
            .map_err(|_| VerificationError::AlreadyInitialized)?;

        tracing::info!(
            method = %self.method,
            code_length = code_length,
            ttl_seconds = ttl_seconds,
            max_attempts = max_attempts,
            unique = unique,
            event = "validator_initialized",
            "Verification method initialized"
        );
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.config.get().is_some()
    }

    async fn pre_check(
        &self,
        user: &UserId,
        value: &str,
        params: &serde_json::Value,
    ) -> DomainResult<String> {
        let config = self.config()?;
        if !(params.is_null() || params.is_object()) {
            return Err(DomainError::Validation {
                message: "Verification parameters must be an object".to_string(),
            });
        }

        let value = self.normalize(value)?;
        self.ensure_unclaimed(config, user, &value).await?;
        Ok(value)
    }

    async fn request(
        &self,
        user: &UserId,
        value: &str,
        params: RequestParams,
    ) -> DomainResult<RequestOutcome> {
        let config = self.config()?;
        let value = self.normalize(value)?;
        let key = self.key(user, &value);

        if let Some(response) = params.response.as_deref().filter(|r| !r.trim().is_empty()) {
            if let Some(record) = self.find(&key).await? {
                if record.is_live_pending(Utc::now()) {
                    self.check_record(config, record, response).await?;
                    return Ok(RequestOutcome::Confirmed);
                }
            }
        }

        let _guard = self.locks.lock(&key).await;

        let prior = self.find(&key).await?;
        Self::ensure_requestable(prior.as_ref(), params.reverify)?;
        self.ensure_unclaimed(config, user, &value).await?;

        let now = Utc::now();
        let enforce_spacing = !prior
            .as_ref()
            .map_or(false, |record| record.is_resend_eligible(now));
        self.acquire_permit(
            &request_key(&self.method, user, &value),
            &config.rate_limit,
            enforce_spacing,
            &value,
        )
        .await?;

        self.issue_and_deliver(config, &key, prior, params).await
    }

    async fn check(&self, user: &UserId, response: &str) -> DomainResult<CheckOutcome> {
        let config = self.config()?;

        let records = self
            .with_store_retry("find_by_user", || self.store.find_by_user(user, &self.method))
            .await?;
        // A live token wins over newer locked or lapsed ones on other values
        let now = Utc::now();
        let record = records
            .iter()
            .filter(|r| r.is_live_pending(now))
            .max_by_key(|r| r.requested_at)
            .or_else(|| {
                records
                    .iter()
                    .filter(|r| {
                        matches!(r.state, CredentialState::Pending | CredentialState::Failed)
                    })
                    .max_by_key(|r| r.requested_at)
            })
            .cloned()
            .ok_or(VerificationError::NotFound)?;

        self.check_record(config, record, response).await
    }

    async fn reset_secret(
        &self,
        value: &str,
        scheme: &str,
        lang: Language,
        temp_token: &[u8],
    ) -> DomainResult<ResetDispatch> {
        let config = self.config()?;
        if temp_token.is_empty() {
            return Err(DomainError::Validation {
                message: "Reset temp token must not be empty".to_string(),
            });
        }

        let value = self.normalize(value)?;
        let verified = self
            .with_store_retry("find_verified_by_value", || {
                self.store.find_verified_by_value(&self.method, &value)
            })
            .await?;
        if verified.is_none() {
            return Err(VerificationError::NotVerified.into());
        }

        self.acquire_permit(
            &reset_key(&self.method, &value),
            &config.rate_limit,
            true,
            &value,
        )
        .await?;

        let expires_at = Utc::now() + config.reset_ttl();
        let payload = DeliveryPayload {
            purpose: DeliveryPurpose::Reset {
                scheme: scheme.to_string(),
            },
            method: self.method.clone(),
            code: None,
            temp_token: temp_token.to_vec(),
            expires_at,
        };
        let message_id = self.deliver(config, &value, &payload, lang).await?;

        tracing::info!(
            method = %self.method,
            value = %mask_credential(&value),
            scheme = scheme,
            message_id = %message_id,
            event = "reset_sent",
            "Secret reset instructions delivered"
        );

        Ok(ResetDispatch {
            message_id,
            expires_at,
        })
    }

    async fn delete(&self, user: &UserId) -> DomainResult<usize> {
        self.config()?;
        let removed = self
            .with_store_retry("delete_by_user", || {
                self.store.delete_by_user(user, &self.method)
            })
            .await?;

        tracing::info!(
            method = %self.method,
            user = %user,
            removed = removed,
            event = "credentials_deleted",
            "Deleted user credentials"
        );
        Ok(removed)
    }
}

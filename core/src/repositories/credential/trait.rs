//! Credential store trait: the access pattern the verification engine needs.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::CredentialRecord;
use crate::domain::value_objects::{CredentialKey, UserId};
use crate::errors::{DomainError, VerificationError};

/// Failures reported by a credential store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Transient backend failure; the engine retries once
    #[error("Credential store unavailable: {message}")]
    Unavailable { message: String },

    /// The write guard did not hold
    #[error("Credential record was modified concurrently")]
    Conflict,

    /// An exclusive Verified write collided with another user's Verified record
    #[error("Credential value is verified by another user")]
    Claimed,
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable { message } => {
                DomainError::Verification(VerificationError::StoreUnavailable { message })
            }
            StoreError::Conflict => DomainError::Internal {
                message: "Credential record was modified concurrently".to_string(),
            },
            StoreError::Claimed => DomainError::Verification(VerificationError::AlreadyClaimed),
        }
    }
}

/// Precondition for a single-record write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteGuard {
    /// Unconditional write
    Any,
    /// Only if no record exists under the key
    Absent,
    /// Only if the stored record still has this revision
    Revision(u64),
}

impl WriteGuard {
    /// Guard matching the state a record was read in
    pub fn for_read(record: Option<&CredentialRecord>) -> Self {
        match record {
            Some(record) => WriteGuard::Revision(record.revision),
            None => WriteGuard::Absent,
        }
    }
}

/// Persistent credential table
///
/// Every operation touches at most one record atomically except the
/// user-wide delete, which needs no cross-record consistency. Writes bump
/// the record revision so callers can compare-and-swap with [`WriteGuard`].
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Get the record for (user, method, value)
    async fn find(&self, key: &CredentialKey) -> Result<Option<CredentialRecord>, StoreError>;

    /// All records of a user under one method
    async fn find_by_user(
        &self,
        user: &UserId,
        method: &str,
    ) -> Result<Vec<CredentialRecord>, StoreError>;

    /// The verified record holding `value` under `method`, whoever owns it
    async fn find_verified_by_value(
        &self,
        method: &str,
        value: &str,
    ) -> Result<Option<CredentialRecord>, StoreError>;

    /// Insert or replace the record under its key
    ///
    /// # Returns
    /// * `Ok(u64)` - The revision now stored
    /// * `Err(StoreError::Conflict)` - The guard did not hold
    /// * `Err(StoreError::Claimed)` - The record is an exclusive Verified
    ///   record and another user already holds the value as Verified
    async fn upsert(&self, record: &CredentialRecord, guard: WriteGuard)
        -> Result<u64, StoreError>;

    /// Remove one record
    ///
    /// # Returns
    /// * `Ok(true)` - The record was removed
    /// * `Ok(false)` - Nothing was stored under the key
    async fn delete(&self, key: &CredentialKey, guard: WriteGuard) -> Result<bool, StoreError>;

    /// Remove every record of a user under one method, returning the count
    async fn delete_by_user(&self, user: &UserId, method: &str) -> Result<usize, StoreError>;
}

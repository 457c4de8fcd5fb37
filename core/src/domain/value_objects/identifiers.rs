//! Identifiers of users and credential records

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{DomainError, DomainResult};

/// Longest user identifier accepted from callers
pub const MAX_USER_ID_LENGTH: usize = 64;

/// Opaque identifier of the user owning a credential
///
/// The engine never interprets it beyond equality; it is handed in by the
/// outer credential-management layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap a caller-supplied identifier, rejecting empty or oversized ones
    pub fn new(id: impl Into<String>) -> DomainResult<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(DomainError::Validation {
                message: "User identifier must not be empty".to_string(),
            });
        }
        if trimmed.len() > MAX_USER_ID_LENGTH {
            return Err(DomainError::Validation {
                message: format!(
                    "User identifier exceeds {} characters",
                    MAX_USER_ID_LENGTH
                ),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identity of one credential record: (user, method, value)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialKey {
    pub user: UserId,
    pub method: String,
    /// Canonical (normalized) credential value
    pub value: String,
}

impl CredentialKey {
    pub fn new(user: UserId, method: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            user,
            method: method.into(),
            value: value.into(),
        }
    }
}

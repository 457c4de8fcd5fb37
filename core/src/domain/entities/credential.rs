//! Credential record entity and its verification state machine.
//!
//! One record exists per (user, method, value). Transitions:
//!
//! ```text
//! Unconfirmed --arm--> Pending --mark_verified--> Verified
//! Pending --record_failure (under limit)--> Pending
//! Pending --record_failure (at limit)--> Failed
//! Failed | Verified --arm--> Pending
//! Pending --expire--> Unconfirmed
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::value_objects::{CredentialKey, UserId};

/// Verification state of a credential record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialState {
    /// Known but never confirmed, or a pending token lapsed
    Unconfirmed,
    /// A confirmation token was issued and awaits the user's response
    Pending,
    /// The user proved control of the value
    Verified,
    /// Locked after too many wrong responses until a fresh request
    Failed,
}

impl CredentialState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialState::Unconfirmed => "unconfirmed",
            CredentialState::Pending => "pending",
            CredentialState::Verified => "verified",
            CredentialState::Failed => "failed",
        }
    }
}

impl fmt::Display for CredentialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unconfirmed" => Ok(CredentialState::Unconfirmed),
            "pending" => Ok(CredentialState::Pending),
            "verified" => Ok(CredentialState::Verified),
            "failed" => Ok(CredentialState::Failed),
            other => Err(format!("Unknown credential state: {}", other)),
        }
    }
}

/// A user's claim on one out-of-band identifier under one method
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub user: UserId,

    /// Method tag, e.g. `tel` or `email`
    pub method: String,

    /// Canonical credential value as produced by the method's normalizer
    pub value: String,

    pub state: CredentialState,

    /// Once Verified, no other user may hold a Verified record for the value
    #[serde(default)]
    pub exclusive: bool,

    /// SHA-256 hex digest of the pending response code
    pub secret_hash: Option<String>,

    /// Identity of the issued token generation
    pub token_id: Option<Uuid>,

    /// Opaque out-of-band token handed to the sender
    pub temp_token: Option<Vec<u8>>,

    /// Failed checks since the last successful request
    pub retry_count: u32,

    pub requested_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,

    /// Set once the sender acknowledged the current token
    pub delivered_at: Option<DateTime<Utc>>,

    /// Provider message id of the last confirmed delivery
    pub message_id: Option<String>,

    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Bumped by the store on every write; zero until first persisted
    pub revision: u64,
}

impl CredentialRecord {
    /// Creates an unconfirmed record with no token material
    pub fn new(user: UserId, method: impl Into<String>, value: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user,
            method: method.into(),
            value: value.into(),
            state: CredentialState::Unconfirmed,
            exclusive: false,
            secret_hash: None,
            token_id: None,
            temp_token: None,
            retry_count: 0,
            requested_at: None,
            expires_at: None,
            delivered_at: None,
            message_id: None,
            verified_at: None,
            created_at: now,
            updated_at: now,
            revision: 0,
        }
    }

    pub fn key(&self) -> CredentialKey {
        CredentialKey::new(self.user.clone(), self.method.clone(), self.value.clone())
    }

    /// Whether the token TTL has elapsed at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now > expires_at,
            None => true,
        }
    }

    /// Pending with a token that can still be checked
    pub fn is_live_pending(&self, now: DateTime<Utc>) -> bool {
        self.state == CredentialState::Pending && !self.is_expired_at(now)
    }

    /// An unexpired pending token whose delivery was never confirmed
    pub fn is_resend_eligible(&self, now: DateTime<Utc>) -> bool {
        self.is_live_pending(now) && self.delivered_at.is_none()
    }

    pub fn has_token_material(&self) -> bool {
        self.secret_hash.is_some() || self.temp_token.is_some() || self.token_id.is_some()
    }

    /// Issue a new token generation and move to Pending
    pub fn arm(
        &mut self,
        secret_hash: String,
        token_id: Uuid,
        temp_token: Vec<u8>,
        ttl: Duration,
        now: DateTime<Utc>,
    ) {
        self.state = CredentialState::Pending;
        self.secret_hash = Some(secret_hash);
        self.token_id = Some(token_id);
        self.temp_token = Some(temp_token);
        self.retry_count = 0;
        self.requested_at = Some(now);
        self.expires_at = Some(now + ttl);
        self.delivered_at = None;
        self.message_id = None;
        self.verified_at = None;
        self.updated_at = now;
    }

    /// Record the sender's acknowledgement of the current token
    pub fn mark_delivered(&mut self, message_id: String, now: DateTime<Utc>) {
        self.delivered_at = Some(now);
        self.message_id = Some(message_id);
        self.updated_at = now;
    }

    /// Successful check: terminal Verified state without token material
    ///
    /// `exclusive` asks the store to refuse the write while another user
    /// holds the value as Verified.
    pub fn mark_verified(&mut self, exclusive: bool, now: DateTime<Utc>) {
        self.state = CredentialState::Verified;
        self.exclusive = exclusive;
        self.retry_count = 0;
        self.verified_at = Some(now);
        self.updated_at = now;
        self.clear_token_material();
    }

    /// Count a wrong response; returns `true` when the record just locked
    pub fn record_failure(&mut self, max_attempts: u32, now: DateTime<Utc>) -> bool {
        self.retry_count = self.retry_count.saturating_add(1);
        self.updated_at = now;
        if self.retry_count >= max_attempts {
            self.state = CredentialState::Failed;
            self.clear_token_material();
            true
        } else {
            false
        }
    }

    /// Remaining wrong responses before the record locks
    pub fn remaining_attempts(&self, max_attempts: u32) -> u32 {
        max_attempts.saturating_sub(self.retry_count)
    }

    /// Lazy correction of a lapsed pending token
    pub fn expire(&mut self, now: DateTime<Utc>) {
        self.state = CredentialState::Unconfirmed;
        self.updated_at = now;
        self.clear_token_material();
    }

    fn clear_token_material(&mut self) {
        self.secret_hash = None;
        self.token_id = None;
        self.temp_token = None;
    }
}

// Token material is never printed.
impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("user", &self.user)
            .field("method", &self.method)
            .field("value", &cv_shared::email::mask_credential(&self.value))
            .field("state", &self.state)
            .field("exclusive", &self.exclusive)
            .field("secret_hash", &self.secret_hash.as_ref().map(|_| "<redacted>"))
            .field("token_id", &self.token_id)
            .field("temp_token", &self.temp_token.as_ref().map(|_| "<redacted>"))
            .field("retry_count", &self.retry_count)
            .field("requested_at", &self.requested_at)
            .field("expires_at", &self.expires_at)
            .field("delivered_at", &self.delivered_at)
            .field("verified_at", &self.verified_at)
            .field("revision", &self.revision)
            .finish()
    }
}

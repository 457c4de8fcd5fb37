//! Parameters and results of verification operations

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use cv_shared::Language;
use std::fmt;

/// Optional inputs of a confirmation request
#[derive(Clone, Default)]
pub struct RequestParams {
    /// Language of the delivered message
    pub lang: Language,
    /// A response the caller already has; checked instead of issuing a new token
    pub response: Option<String>,
    /// Opaque token to embed in the message; generated when absent
    pub temp_token: Option<Vec<u8>>,
    /// Re-arm an already verified credential
    pub reverify: bool,
}

impl RequestParams {
    pub fn new(lang: Language) -> Self {
        Self {
            lang,
            ..Default::default()
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    pub fn with_temp_token(mut self, temp_token: Vec<u8>) -> Self {
        self.temp_token = Some(temp_token);
        self
    }

    pub fn reverify(mut self) -> Self {
        self.reverify = true;
        self
    }
}

impl fmt::Debug for RequestParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestParams")
            .field("lang", &self.lang)
            .field("has_response", &self.response.is_some())
            .field("has_temp_token", &self.temp_token.is_some())
            .field("reverify", &self.reverify)
            .finish()
    }
}

/// Result of a confirmation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A new token was delivered
    Sent {
        expires_at: DateTime<Utc>,
        message_id: String,
        /// Earliest time another request passes the spacing check
        next_request_at: Option<DateTime<Utc>>,
    },
    /// The supplied response confirmed the pending token
    Confirmed,
}

/// Result of a successful check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    /// The credential value now verified
    pub value: String,
    pub verified_at: DateTime<Utc>,
}

/// Result of a dispatched reset message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetDispatch {
    pub message_id: String,
    /// Validity announced for the reset temp token
    pub expires_at: DateTime<Utc>,
}

/// What a delivered message is for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryPurpose {
    /// Confirmation code for a pending credential
    Confirmation,
    /// Authentication secret reset under `scheme`
    Reset { scheme: String },
}

/// Content handed to a sender
#[derive(Clone)]
pub struct DeliveryPayload {
    pub purpose: DeliveryPurpose,
    pub method: String,
    /// Response code; present for confirmations only
    pub code: Option<String>,
    pub temp_token: Vec<u8>,
    pub expires_at: DateTime<Utc>,
}

impl DeliveryPayload {
    /// Temp token in URL-safe base64, for links
    pub fn temp_token_b64(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.temp_token)
    }
}

impl fmt::Debug for DeliveryPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryPayload")
            .field("purpose", &self.purpose)
            .field("method", &self.method)
            .field("code", &self.code.as_ref().map(|_| "<redacted>"))
            .field("temp_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

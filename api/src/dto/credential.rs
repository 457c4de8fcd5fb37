//! Bodies of the `/api/v1/credentials/{method}` endpoints

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use cv_core::{CheckOutcome, RequestOutcome, RequestParams, ResetDispatch};
use cv_shared::Language;

use crate::handlers::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PreCheckRequest {
    #[validate(length(min = 1, max = 64))]
    pub user: String,
    #[validate(length(min = 1, max = 320))]
    pub value: String,
    /// Method-specific parameters, passed through untouched
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreCheckResponse {
    /// Canonical form of the submitted value
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CredentialRequest {
    #[validate(length(min = 1, max = 64))]
    pub user: String,
    #[validate(length(min = 1, max = 320))]
    pub value: String,
    /// Message language; `Accept-Language` is used when absent
    #[serde(default)]
    pub lang: Option<String>,
    /// A response the caller already holds
    #[serde(default)]
    #[validate(length(min = 1, max = 64))]
    pub response: Option<String>,
    /// URL-safe base64 token to embed in the message
    #[serde(default)]
    #[validate(length(min = 1, max = 512))]
    pub temp_token: Option<String>,
    #[serde(default)]
    pub reverify: bool,
}

impl CredentialRequest {
    /// Engine parameters, with `fallback` as the language when none was given
    pub fn params(&self, fallback: Language) -> Result<RequestParams, ApiError> {
        let lang = self
            .lang
            .as_deref()
            .map(Language::from_tag)
            .unwrap_or(fallback);

        let mut params = RequestParams::new(lang);
        if let Some(response) = &self.response {
            params = params.with_response(response.clone());
        }
        if let Some(token) = &self.temp_token {
            params = params.with_temp_token(decode_temp_token(token)?);
        }
        if self.reverify {
            params = params.reverify();
        }
        Ok(params)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CredentialRequestResponse {
    Sent {
        expires_at: DateTime<Utc>,
        message_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        next_request_at: Option<DateTime<Utc>>,
    },
    Confirmed,
}

impl From<RequestOutcome> for CredentialRequestResponse {
    fn from(outcome: RequestOutcome) -> Self {
        match outcome {
            RequestOutcome::Sent {
                expires_at,
                message_id,
                next_request_at,
            } => CredentialRequestResponse::Sent {
                expires_at,
                message_id,
                next_request_at,
            },
            RequestOutcome::Confirmed => CredentialRequestResponse::Confirmed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CheckRequest {
    #[validate(length(min = 1, max = 64))]
    pub user: String,
    #[validate(length(min = 1, max = 64))]
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResponse {
    pub value: String,
    pub verified_at: DateTime<Utc>,
}

impl From<CheckOutcome> for CheckResponse {
    fn from(outcome: CheckOutcome) -> Self {
        Self {
            value: outcome.value,
            verified_at: outcome.verified_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResetRequest {
    #[validate(length(min = 1, max = 320))]
    pub value: String,
    /// Authentication scheme whose secret is being reset (e.g. "basic")
    #[validate(length(min = 1, max = 32))]
    pub scheme: String,
    #[serde(default)]
    pub lang: Option<String>,
    /// URL-safe base64 token the reset link carries
    #[validate(length(min = 1, max = 512))]
    pub temp_token: String,
}

impl ResetRequest {
    pub fn language(&self, fallback: Language) -> Language {
        self.lang.as_deref().map(Language::from_tag).unwrap_or(fallback)
    }

    pub fn decoded_token(&self) -> Result<Vec<u8>, ApiError> {
        decode_temp_token(&self.temp_token)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    pub message_id: String,
    pub expires_at: DateTime<Utc>,
}

impl From<ResetDispatch> for ResetResponse {
    fn from(dispatch: ResetDispatch) -> Self {
        Self {
            message_id: dispatch.message_id,
            expires_at: dispatch.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Records removed; zero when the user had none
    pub removed: usize,
}

fn decode_temp_token(token: &str) -> Result<Vec<u8>, ApiError> {
    URL_SAFE_NO_PAD
        .decode(token.trim_end_matches('='))
        .map_err(|e| ApiError::Malformed {
            field: "temp_token",
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(token: Option<&str>) -> CredentialRequest {
        CredentialRequest {
            user: "usr1".to_string(),
            value: "+15551234567".to_string(),
            temp_token: token.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_params_use_fallback_language() {
        let params = request(None).params(Language::Chinese).unwrap();
        assert_eq!(params.lang, Language::Chinese);
        assert!(params.temp_token.is_none());
        assert!(!params.reverify);
    }

    #[test]
    fn test_params_prefer_explicit_language() {
        let mut body = request(None);
        body.lang = Some("en-GB".to_string());
        assert_eq!(body.params(Language::Chinese).unwrap().lang, Language::English);
    }

    #[test]
    fn test_params_decode_temp_token() {
        let params = request(Some("-_8B")).params(Language::English).unwrap();
        assert_eq!(params.temp_token, Some(vec![0xfb, 0xff, 0x01]));
    }

    #[test]
    fn test_params_reject_bad_temp_token() {
        assert!(matches!(
            request(Some("not base64!")).params(Language::English),
            Err(ApiError::Malformed { field: "temp_token", .. })
        ));
    }

    #[test]
    fn test_validation_limits() {
        let mut body = request(None);
        assert!(body.validate().is_ok());

        body.user = String::new();
        assert!(body.validate().is_err());
    }

    #[test]
    fn test_confirmed_response_shape() {
        let json = serde_json::to_value(CredentialRequestResponse::Confirmed).unwrap();
        assert_eq!(json["status"], "confirmed");
    }
}

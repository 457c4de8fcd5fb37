//! Bilingual message bodies for confirmation and reset deliveries

use chrono::{DateTime, Utc};
use cv_core::{DeliveryPayload, DeliveryPurpose};
use cv_shared::Language;

/// Product name shown in messages
pub const DEFAULT_BRAND: &str = "CredVerify";

/// Reset page used when none is configured
pub const DEFAULT_RESET_URL: &str = "https://localhost/reset";

/// Renders payloads into user-facing text
#[derive(Debug, Clone)]
pub struct MessageTemplates {
    brand: String,
    reset_url: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            brand: DEFAULT_BRAND.to_string(),
            reset_url: DEFAULT_RESET_URL.to_string(),
        }
    }
}

impl MessageTemplates {
    pub fn new(brand: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            ..Default::default()
        }
    }

    pub fn with_reset_url(mut self, reset_url: impl Into<String>) -> Self {
        self.reset_url = reset_url.into();
        self
    }

    /// Link carrying the payload's temp token
    pub fn reset_link(&self, payload: &DeliveryPayload) -> String {
        let separator = if self.reset_url.contains('?') { '&' } else { '?' };
        format!("{}{}token={}", self.reset_url, separator, payload.temp_token_b64())
    }

    /// Message text for `payload` in `lang`, with validity counted from `now`
    pub fn render(&self, payload: &DeliveryPayload, lang: Language, now: DateTime<Utc>) -> String {
        let minutes = minutes_left(payload.expires_at, now);
        let brand = &self.brand;

        match (&payload.purpose, lang) {
            (DeliveryPurpose::Confirmation, Language::English) => format!(
                "Your {} verification code is {}. It expires in {} minutes. Do not share it with anyone.",
                brand,
                payload.code.as_deref().unwrap_or_default(),
                minutes
            ),
            (DeliveryPurpose::Confirmation, Language::Chinese) => format!(
                "【{}】您的验证码是{}，{}分钟内有效，请勿泄露给他人。",
                brand,
                payload.code.as_deref().unwrap_or_default(),
                minutes
            ),
            (DeliveryPurpose::Reset { scheme }, Language::English) => format!(
                "{}: use {} to reset your {} credentials. The link expires in {} minutes.",
                brand,
                self.reset_link(payload),
                scheme,
                minutes
            ),
            (DeliveryPurpose::Reset { scheme }, Language::Chinese) => format!(
                "【{}】请访问 {} 重置您的{}凭据，链接{}分钟内有效。",
                brand,
                self.reset_link(payload),
                scheme,
                minutes
            ),
        }
    }
}

/// Whole minutes until `expires_at`, rounded up, at least one
fn minutes_left(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = (expires_at - now).num_seconds().max(0);
    ((seconds + 59) / 60).max(1)
}

//! Unit tests for message templates

use chrono::{Duration, Utc};
use cv_core::{DeliveryPayload, DeliveryPurpose};
use cv_shared::Language;

use crate::sender::MessageTemplates;

fn confirmation(code: &str, ttl_seconds: i64) -> DeliveryPayload {
    DeliveryPayload {
        purpose: DeliveryPurpose::Confirmation,
        method: "tel".to_string(),
        code: Some(code.to_string()),
        temp_token: vec![0xfb, 0xff, 0x01],
        expires_at: Utc::now() + Duration::seconds(ttl_seconds),
    }
}

fn reset() -> DeliveryPayload {
    DeliveryPayload {
        purpose: DeliveryPurpose::Reset {
            scheme: "basic".to_string(),
        },
        method: "tel".to_string(),
        code: None,
        temp_token: vec![0xfb, 0xff, 0x01],
        expires_at: Utc::now() + Duration::seconds(900),
    }
}

#[test]
fn test_confirmation_english() {
    let templates = MessageTemplates::default();
    let payload = confirmation("042917", 300);
    let body = templates.render(&payload, Language::English, Utc::now());

    assert!(body.contains("042917"));
    assert!(body.contains("5 minutes"));
    assert!(body.contains("CredVerify"));
}

#[test]
fn test_confirmation_chinese() {
    let templates = MessageTemplates::new("Acme");
    let payload = confirmation("123456", 300);
    let body = templates.render(&payload, Language::Chinese, Utc::now());

    assert!(body.starts_with("【Acme】"));
    assert!(body.contains("123456"));
    assert!(body.contains("5分钟"));
}

#[test]
fn test_minutes_round_up() {
    let templates = MessageTemplates::default();
    let payload = confirmation("123456", 61);
    let body = templates.render(&payload, Language::English, payload.expires_at - Duration::seconds(61));
    assert!(body.contains("2 minutes"));

    let body = templates.render(&payload, Language::English, payload.expires_at);
    assert!(body.contains("1 minutes"));
}

#[test]
fn test_reset_link_carries_url_safe_token() {
    let templates = MessageTemplates::default().with_reset_url("https://example.com/reset");
    let payload = reset();

    assert_eq!(templates.reset_link(&payload), "https://example.com/reset?token=-_8B");

    let body = templates.render(&payload, Language::English, Utc::now());
    assert!(body.contains("https://example.com/reset?token=-_8B"));
    assert!(body.contains("basic"));
}

#[test]
fn test_reset_link_appends_to_existing_query() {
    let templates = MessageTemplates::default().with_reset_url("https://example.com/r?app=1");
    assert_eq!(
        templates.reset_link(&reset()),
        "https://example.com/r?app=1&token=-_8B"
    );
}

//! Unit tests for verification error types

use cv_shared::Language;

use crate::errors::{extract_chinese_message, extract_english_message};
use crate::errors::{DomainError, VerificationError};

#[test]
fn test_error_messages_are_bilingual() {
    let error = VerificationError::RateLimited {
        retry_after_seconds: 42,
    };
    let message = error.to_string();
    assert!(message.contains("Too many requests"));
    assert!(message.contains("请求过于频繁"));
    assert!(message.contains("42"));
}

#[test]
fn test_localized_message() {
    let error = VerificationError::InvalidResponse {
        remaining_attempts: 2,
    };
    assert_eq!(
        error.localized(Language::English),
        "Invalid confirmation code. 2 attempts remaining"
    );
    assert_eq!(error.localized(Language::Chinese), "验证码错误，剩余 2 次尝试机会");
}

#[test]
fn test_error_codes() {
    assert_eq!(VerificationError::AlreadyClaimed.code(), "ALREADY_CLAIMED");
    assert_eq!(VerificationError::NotFound.code(), "CREDENTIAL_NOT_FOUND");
    assert_eq!(
        VerificationError::MaxAttemptsExceeded.code(),
        "MAX_ATTEMPTS_EXCEEDED"
    );
    assert_eq!(
        VerificationError::UnknownMethod {
            method: "fax".to_string()
        }
        .code(),
        "UNKNOWN_METHOD"
    );
}

#[test]
fn test_retryable_classification() {
    assert!(VerificationError::RateLimited {
        retry_after_seconds: 1
    }
    .is_retryable());
    assert!(VerificationError::DeliveryFailed {
        reason: "timeout".to_string()
    }
    .is_retryable());
    assert!(!VerificationError::Expired.is_retryable());
    assert!(!VerificationError::MaxAttemptsExceeded.is_retryable());
}

#[test]
fn test_delivery_failure_reason_not_in_message() {
    let error = VerificationError::DeliveryFailed {
        reason: "twilio 21211 invalid 'To' number".to_string(),
    };
    assert!(!error.to_string().contains("twilio"));
}

#[test]
fn test_domain_error_bridge() {
    let error: DomainError = VerificationError::Expired.into();
    assert_eq!(error.as_verification(), Some(&VerificationError::Expired));

    let error = DomainError::Internal {
        message: "boom".to_string(),
    };
    assert!(error.as_verification().is_none());
}

#[test]
fn test_message_extraction() {
    let bilingual = "Invalid token | 无效的令牌";
    assert_eq!(extract_english_message(bilingual), "Invalid token");
    assert_eq!(extract_chinese_message(bilingual), "无效的令牌");

    let english_only = "Only English";
    assert_eq!(extract_english_message(english_only), "Only English");
    assert_eq!(extract_chinese_message(english_only), "Only English");
}

//! Verification error taxonomy with bilingual messages
//!
//! Every failure an engine operation can surface to its caller is one
//! variant of [`VerificationError`]. Messages carry both the English and the
//! Chinese text separated by `" | "`; the presentation layer picks one with
//! [`VerificationError::localized`].

use cv_shared::{error_codes, Language};
use thiserror::Error;

/// Failures surfaced by the verification engine and the validator registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Invalid credential format: {reason} | 凭证格式无效: {reason}")]
    InvalidFormat { reason: String },

    #[error("Credential is already claimed by another user | 该凭证已被其他用户占用")]
    AlreadyClaimed,

    #[error("Credential is already verified | 该凭证已完成验证")]
    AlreadyVerified,

    #[error("Too many requests. Please try again in {retry_after_seconds} seconds | 请求过于频繁，请在 {retry_after_seconds} 秒后重试")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Failed to deliver the confirmation message. Please try again later | 验证消息发送失败，请稍后重试")]
    DeliveryFailed { reason: String },

    #[error("Confirmation code expired. Please request a new one | 验证码已过期，请重新获取")]
    Expired,

    #[error("No pending confirmation found | 未找到待验证的凭证")]
    NotFound,

    #[error("Invalid confirmation code. {remaining_attempts} attempts remaining | 验证码错误，剩余 {remaining_attempts} 次尝试机会")]
    InvalidResponse { remaining_attempts: u32 },

    #[error("Maximum attempts exceeded. Please request a new code | 尝试次数超限，请重新获取验证码")]
    MaxAttemptsExceeded,

    #[error("Credential is not verified | 该凭证尚未验证")]
    NotVerified,

    #[error("Credential store unavailable | 凭证存储暂不可用")]
    StoreUnavailable { message: String },

    #[error("Validator is not initialized | 验证器尚未初始化")]
    NotInitialized,

    #[error("Validator is already initialized | 验证器已初始化")]
    AlreadyInitialized,

    #[error("Unknown verification method: {method} | 未知的验证方式: {method}")]
    UnknownMethod { method: String },
}

impl VerificationError {
    /// Stable error code for programmatic handling
    pub fn code(&self) -> &'static str {
        match self {
            VerificationError::InvalidFormat { .. } => error_codes::INVALID_FORMAT,
            VerificationError::AlreadyClaimed => error_codes::ALREADY_CLAIMED,
            VerificationError::AlreadyVerified => error_codes::ALREADY_VERIFIED,
            VerificationError::RateLimited { .. } => error_codes::RATE_LIMITED,
            VerificationError::DeliveryFailed { .. } => error_codes::DELIVERY_FAILED,
            VerificationError::Expired => error_codes::EXPIRED,
            VerificationError::NotFound => error_codes::CREDENTIAL_NOT_FOUND,
            VerificationError::InvalidResponse { .. } => error_codes::INVALID_RESPONSE,
            VerificationError::MaxAttemptsExceeded => error_codes::MAX_ATTEMPTS_EXCEEDED,
            VerificationError::NotVerified => error_codes::NOT_VERIFIED,
            VerificationError::StoreUnavailable { .. } => error_codes::STORE_UNAVAILABLE,
            VerificationError::NotInitialized => error_codes::NOT_INITIALIZED,
            VerificationError::AlreadyInitialized => error_codes::ALREADY_INITIALIZED,
            VerificationError::UnknownMethod { .. } => error_codes::UNKNOWN_METHOD,
        }
    }

    /// Whether the caller may retry the same call later and expect success
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VerificationError::RateLimited { .. }
                | VerificationError::DeliveryFailed { .. }
                | VerificationError::StoreUnavailable { .. }
        )
    }

    /// Message in the requested language
    pub fn localized(&self, lang: Language) -> String {
        let message = self.to_string();
        match lang {
            Language::English => extract_english_message(&message),
            Language::Chinese => extract_chinese_message(&message),
        }
    }
}

/// Extract the English half of a bilingual message
pub fn extract_english_message(message: &str) -> String {
    match message.find(" | ") {
        Some(pipe_index) => message[..pipe_index].to_string(),
        None => message.to_string(),
    }
}

/// Extract the Chinese half of a bilingual message
pub fn extract_chinese_message(message: &str) -> String {
    match message.find(" | ") {
        Some(pipe_index) => message[pipe_index + 3..].to_string(),
        None => message.to_string(),
    }
}

//! Email addresses, lower-cased

use cv_core::{Normalizer, VerificationError};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9._%+-]+@[a-z0-9-]+(\.[a-z0-9-]+)*\.[a-z]{2,}$")
        .expect("valid email pattern")
});

/// Longest address accepted (RFC 5321 path limit)
const MAX_EMAIL_LENGTH: usize = 254;

#[derive(Debug, Clone, Copy, Default)]
pub struct EmailNormalizer;

impl Normalizer for EmailNormalizer {
    fn normalize(&self, raw: &str) -> Result<String, VerificationError> {
        let candidate = raw.trim().to_lowercase();
        if candidate.len() > MAX_EMAIL_LENGTH {
            return Err(VerificationError::InvalidFormat {
                reason: "email address is too long".to_string(),
            });
        }
        if !EMAIL_REGEX.is_match(&candidate) {
            return Err(VerificationError::InvalidFormat {
                reason: "not an email address".to_string(),
            });
        }
        Ok(candidate)
    }
}

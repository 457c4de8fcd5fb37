//! Phone number utilities

use once_cell::sync::Lazy;
use regex::Regex;

// International phone number regex (E.164 format)
static E164_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+[1-9]\d{6,14}$").expect("valid E.164 pattern")
});

/// Remove common formatting characters, keeping digits and a leading '+'
pub fn strip_formatting(phone: &str) -> String {
    let trimmed = phone.trim();
    let mut out = String::with_capacity(trimmed.len());
    for (i, c) in trimmed.chars().enumerate() {
        if c.is_ascii_digit() || (c == '+' && i == 0) {
            out.push(c);
        }
    }
    out
}

/// Check if a phone number is in E.164 format
pub fn is_e164(phone: &str) -> bool {
    E164_REGEX.is_match(phone)
}

/// Mask a phone number for logging, keeping the last 4 digits
///
/// `+15551234567` becomes `+*******4567`.
pub fn mask_phone_number(phone: &str) -> String {
    let count = phone.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }

    let visible: String = phone.chars().skip(count - 4).collect();
    if phone.starts_with('+') {
        format!("+{}{}", "*".repeat(count - 5), visible)
    } else {
        format!("{}{}", "*".repeat(count - 4), visible)
    }
}

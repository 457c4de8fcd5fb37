//! Email address utilities

/// Mask an email address for logging
///
/// `alice@example.com` becomes `a****@example.com`.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{}****@{}", first, domain)
        }
        None => "****".to_string(),
    }
}

/// Mask a credential value of unknown kind for logging
pub fn mask_credential(value: &str) -> String {
    if value.contains('@') {
        mask_email(value)
    } else {
        super::phone::mask_phone_number(value)
    }
}

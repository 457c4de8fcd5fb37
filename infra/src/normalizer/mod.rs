//! Identifier normalizers
//!
//! Each method maps raw user input to one canonical string so that the same
//! identifier typed two ways lands on the same credential record.

mod email;
mod phone;


pub use email::EmailNormalizer;
pub use phone::E164Normalizer;

use cv_core::Normalizer;
use std::sync::Arc;

use crate::InfrastructureError;

/// Create the normalizer registered under `name` ("e164", "email")
pub fn create_normalizer(name: &str) -> Result<Arc<dyn Normalizer>, InfrastructureError> {
    match name {
        "e164" | "tel" => Ok(Arc::new(E164Normalizer::new())),
        "email" => Ok(Arc::new(EmailNormalizer)),
        other => Err(InfrastructureError::Config(format!(
            "Unknown normalizer '{}'",
            other
        ))),
    }
}

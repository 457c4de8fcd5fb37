//! Domain-specific error types and error handling.

mod types;

#[cfg(test)]
mod tests;

pub use types::{extract_chinese_message, extract_english_message, VerificationError};

use thiserror::Error;

/// Core domain errors (general purpose)
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to the verification taxonomy
    #[error(transparent)]
    Verification(#[from] VerificationError),
}

impl DomainError {
    /// Borrow the verification error, if this is one
    pub fn as_verification(&self) -> Option<&VerificationError> {
        match self {
            DomainError::Verification(err) => Some(err),
            _ => None,
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

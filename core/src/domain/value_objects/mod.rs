//! Value objects representing immutable domain concepts.

pub mod identifiers;

// Re-export commonly used types
pub use identifiers::{CredentialKey, UserId, MAX_USER_ID_LENGTH};

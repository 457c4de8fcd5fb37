//! Domain entities representing core business objects.

pub mod credential;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use credential::{CredentialRecord, CredentialState};

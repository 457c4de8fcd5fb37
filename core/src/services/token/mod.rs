//! Token generation for credential confirmation
//!
//! This module produces:
//! - User-facing numeric response codes drawn from the OS CSPRNG
//! - Opaque temp tokens for reset and confirmation links
//! - SHA-256 digests of codes for storage and constant-time verification

mod generator;

#[cfg(test)]
mod tests;

pub use generator::{
    IssuedToken, TokenGenerator, MAX_CODE_LENGTH, MIN_CODE_LENGTH, TEMP_TOKEN_BYTES,
};

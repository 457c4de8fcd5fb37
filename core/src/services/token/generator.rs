//! Confirmation code and temp token generator

use constant_time_eq::constant_time_eq;
use rand::{rngs::OsRng, Rng, RngCore};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

use crate::errors::{DomainError, DomainResult};

/// Shortest response code a method may be configured with
pub const MIN_CODE_LENGTH: usize = 4;

/// Longest response code a method may be configured with
pub const MAX_CODE_LENGTH: usize = 10;

/// Size of a generated opaque temp token
pub const TEMP_TOKEN_BYTES: usize = 32;

/// Draws before giving up on finding a code unused by sibling records
const MAX_CODE_DRAWS: usize = 16;

/// One issued token generation
#[derive(Clone)]
pub struct IssuedToken {
    /// Plain response code, only ever handed to the sender
    pub code: String,
    /// SHA-256 hex digest of `code`
    pub secret_hash: String,
    /// Identity of this generation
    pub token_id: Uuid,
    pub temp_token: Vec<u8>,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("code", &"<redacted>")
            .field("token_id", &self.token_id)
            .finish_non_exhaustive()
    }
}

/// Generates unguessable response codes of a fixed length
#[derive(Debug, Clone, Copy)]
pub struct TokenGenerator {
    code_length: usize,
}

impl TokenGenerator {
    /// Create a generator for codes of `code_length` digits
    pub fn new(code_length: usize) -> DomainResult<Self> {
        if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&code_length) {
            return Err(DomainError::Configuration {
                message: format!(
                    "code_length must be between {} and {}, got {}",
                    MIN_CODE_LENGTH, MAX_CODE_LENGTH, code_length
                ),
            });
        }
        Ok(Self { code_length })
    }

    pub fn code_length(&self) -> usize {
        self.code_length
    }

    /// Number of distinct codes this generator can produce
    pub fn code_space(&self) -> u64 {
        10u64.pow(self.code_length as u32)
    }

    /// Generate a uniformly distributed numeric code
    ///
    /// Uses OsRng (OS-provided CSPRNG); `gen_range` rejects out-of-range
    /// samples so there is no modulo bias.
    pub fn generate_code(&self) -> String {
        let code = OsRng.gen_range(0..self.code_space());
        format!("{:0width$}", code, width = self.code_length)
    }

    /// Generate a random opaque temp token
    pub fn generate_temp_token() -> Vec<u8> {
        let mut token = vec![0u8; TEMP_TOKEN_BYTES];
        OsRng.fill_bytes(&mut token);
        token
    }

    /// Issue a new token generation
    ///
    /// The code never equals one whose digest appears in `avoid_hashes`
    /// (the live pending codes of the same user and method). A caller-supplied
    /// temp token is kept, otherwise a random one is generated.
    pub fn issue(
        &self,
        temp_token: Option<Vec<u8>>,
        avoid_hashes: &[String],
    ) -> DomainResult<IssuedToken> {
        for _ in 0..MAX_CODE_DRAWS {
            let code = self.generate_code();
            let secret_hash = Self::hash_code(&code);
            if avoid_hashes.iter().any(|h| h == &secret_hash) {
                continue;
            }
            return Ok(IssuedToken {
                code,
                secret_hash,
                token_id: Uuid::new_v4(),
                temp_token: temp_token
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(Self::generate_temp_token),
            });
        }

        Err(DomainError::Internal {
            message: "Unable to draw a response code distinct from pending codes".to_string(),
        })
    }

    /// SHA-256 hex digest of a response code
    pub fn hash_code(code: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(code.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Compare a submitted response with a stored digest in constant time
    pub fn verify(response: &str, secret_hash: &str) -> bool {
        let candidate = Self::hash_code(response.trim());
        constant_time_eq(candidate.as_bytes(), secret_hash.as_bytes())
    }
}

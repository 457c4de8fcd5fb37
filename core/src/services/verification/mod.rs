//! Credential verification: engine, capability traits and registry
//!
//! This module provides the complete confirmation workflow:
//! - Normalization and uniqueness checks (PreCheck)
//! - Token issuance, throttling and bounded delivery (Request)
//! - Constant-time response checks with lockout (Check)
//! - Secret-reset messages to verified values (ResetSecret)
//! - Idempotent removal of a user's records (Delete)

mod config;
mod engine;
mod locks;
mod registry;
mod traits;
mod types;
mod validator;

#[cfg(test)]
mod tests;

pub use config::{MethodConfig, MAX_GUESS_PROBABILITY};
pub use engine::VerificationEngine;
pub use registry::{CredentialDescriptor, ValidatorRegistry, ValidatorRegistryBuilder};
pub use traits::{DeliveryError, Normalizer, Sender};
pub use types::{
    CheckOutcome, DeliveryPayload, DeliveryPurpose, RequestOutcome, RequestParams, ResetDispatch,
};
pub use validator::CredentialValidator;

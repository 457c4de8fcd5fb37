//! # CredVerify Core
//!
//! Core domain layer of the credential verification engine: the credential
//! record and its state machine, the capability traits the engine calls out
//! to (store, rate limiter, sender, normalizer), the engine itself and the
//! registry that maps method tags to configured engines.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;

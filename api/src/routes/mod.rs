//! Route handlers
//!
//! - `credentials` - per-method verification endpoints
//! - `health` - liveness check listing registered methods

pub mod credentials;
pub mod health;

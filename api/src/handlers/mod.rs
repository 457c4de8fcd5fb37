//! Shared request handling helpers

pub mod error;

pub use error::{request_language, verification_status, ApiError};

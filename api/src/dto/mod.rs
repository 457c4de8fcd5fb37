//! Request and response bodies

pub mod credential;
pub mod health;

pub use credential::{
    CheckRequest, CheckResponse, CredentialRequest, CredentialRequestResponse, DeleteResponse,
    PreCheckRequest, PreCheckResponse, ResetRequest, ResetResponse,
};
pub use health::HealthResponse;

//! HTTP surface of the CredVerify engine
//!
//! Exposes every registered validator under `/api/v1/credentials/{method}`
//! and maps engine failures to localized JSON error bodies.

pub mod app;
pub mod dto;
pub mod handlers;
pub mod routes;
pub mod telemetry;

pub use app::{configure, create_app, AppState};

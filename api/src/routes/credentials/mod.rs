//! Credential verification routes
//!
//! Every route is scoped by method tag; the tag selects the validator from
//! the registry and an unregistered tag answers 404 `UNKNOWN_METHOD`.

pub mod check;
pub mod delete;
pub mod precheck;
pub mod request;
pub mod reset;

use std::sync::Arc;

use actix_web::web;
use cv_core::{CredentialValidator, UserId};

use crate::app::AppState;
use crate::handlers::ApiError;

pub use check::check;
pub use delete::delete;
pub use precheck::precheck;
pub use request::request;
pub use reset::reset;

/// Mount the routes under `/credentials/{method}`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/credentials/{method}")
            .route("/precheck", web::post().to(precheck))
            .route("/request", web::post().to(request))
            .route("/check", web::post().to(check))
            .route("/reset", web::post().to(reset))
            .route("/users/{user}", web::delete().to(delete)),
    );
}

fn validator_for(
    state: &AppState,
    method: &str,
) -> Result<Arc<dyn CredentialValidator>, ApiError> {
    Ok(state.registry.get(method)?)
}

fn user_id(raw: &str) -> Result<UserId, ApiError> {
    Ok(UserId::new(raw)?)
}

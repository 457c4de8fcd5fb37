use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use cv_shared::Language;

use crate::app::AppState;
use crate::dto::{ResetRequest, ResetResponse};
use crate::handlers::{request_language, ApiError};

use super::validator_for;

/// Handler for POST /api/v1/credentials/{method}/reset
///
/// Sends secret-reset instructions carrying `temp_token` to a verified
/// value. Nothing is stored; the caller keeps the token to validate the
/// reset link.
pub async fn reset(
    req: HttpRequest,
    state: web::Data<AppState>,
    method: web::Path<String>,
    body: web::Json<ResetRequest>,
) -> HttpResponse {
    let lang = request_language(&req);
    match handle(&state, &method, body.into_inner(), lang).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(error) => error.to_response(lang),
    }
}

async fn handle(
    state: &AppState,
    method: &str,
    body: ResetRequest,
    lang: Language,
) -> Result<ResetResponse, ApiError> {
    body.validate()?;
    let validator = validator_for(state, method)?;
    let temp_token = body.decoded_token()?;

    let dispatch = validator
        .reset_secret(&body.value, &body.scheme, body.language(lang), &temp_token)
        .await?;
    Ok(dispatch.into())
}

use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use crate::app::AppState;
use crate::dto::{CheckRequest, CheckResponse};
use crate::handlers::{request_language, ApiError};

use super::{user_id, validator_for};

/// Handler for POST /api/v1/credentials/{method}/check
///
/// Checks the user's response against their pending confirmation. A wrong
/// response answers 400 `INVALID_RESPONSE` with `remaining_attempts`.
pub async fn check(
    req: HttpRequest,
    state: web::Data<AppState>,
    method: web::Path<String>,
    body: web::Json<CheckRequest>,
) -> HttpResponse {
    let lang = request_language(&req);
    match handle(&state, &method, body.into_inner()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(error) => error.to_response(lang),
    }
}

async fn handle(
    state: &AppState,
    method: &str,
    body: CheckRequest,
) -> Result<CheckResponse, ApiError> {
    body.validate()?;
    let validator = validator_for(state, method)?;
    let user = user_id(&body.user)?;

    let outcome = validator.check(&user, &body.response).await?;
    Ok(outcome.into())
}

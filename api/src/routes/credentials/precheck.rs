use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use crate::app::AppState;
use crate::dto::{PreCheckRequest, PreCheckResponse};
use crate::handlers::{request_language, ApiError};

use super::{user_id, validator_for};

/// Handler for POST /api/v1/credentials/{method}/precheck
///
/// Validates and canonicalizes a value without creating any record.
///
/// # Request Body
///
/// ```json
/// { "user": "usr1", "value": "+1 (555) 123-4567" }
/// ```
///
/// # Response
///
/// ```json
/// { "value": "+15551234567" }
/// ```
pub async fn precheck(
    req: HttpRequest,
    state: web::Data<AppState>,
    method: web::Path<String>,
    body: web::Json<PreCheckRequest>,
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
    body: PreCheckRequest,
) -> Result<PreCheckResponse, ApiError> {
    body.validate()?;
    let validator = validator_for(state, method)?;
    let user = user_id(&body.user)?;

    let value = validator.pre_check(&user, &body.value, &body.params).await?;
    Ok(PreCheckResponse { value })
}

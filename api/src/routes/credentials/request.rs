use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use cv_shared::Language;

use crate::app::AppState;
use crate::dto::{CredentialRequest, CredentialRequestResponse};
use crate::handlers::{request_language, ApiError};

use super::{user_id, validator_for};

/// Handler for POST /api/v1/credentials/{method}/request
///
/// Issues a confirmation token and delivers it to the value. When the body
/// carries a `response`, it is checked instead and the answer is
/// `{"status": "confirmed"}`.
///
/// # Request Body
///
/// ```json
/// { "user": "usr1", "value": "+15551234567", "lang": "zh" }
/// ```
///
/// # Response
///
/// ```json
/// {
///     "status": "sent",
///     "expires_at": "2025-08-14T10:05:00Z",
///     "message_id": "SM123",
///     "next_request_at": "2025-08-14T10:01:00Z"
/// }
/// ```
pub async fn request(
    req: HttpRequest,
    state: web::Data<AppState>,
    method: web::Path<String>,
    body: web::Json<CredentialRequest>,
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
    body: CredentialRequest,
    lang: Language,
) -> Result<CredentialRequestResponse, ApiError> {
    body.validate()?;
    let validator = validator_for(state, method)?;
    let user = user_id(&body.user)?;
    let params = body.params(lang)?;

    let outcome = validator.request(&user, &body.value, params).await?;
    Ok(outcome.into())
}

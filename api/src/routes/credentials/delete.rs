use actix_web::{web, HttpRequest, HttpResponse};

use crate::app::AppState;
use crate::dto::DeleteResponse;
use crate::handlers::{request_language, ApiError};

use super::{user_id, validator_for};

/// Handler for DELETE /api/v1/credentials/{method}/users/{user}
///
/// Idempotent: deleting a user without records answers `{"removed": 0}`.
pub async fn delete(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let lang = request_language(&req);
    let (method, user) = path.into_inner();
    match handle(&state, &method, &user).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(error) => error.to_response(lang),
    }
}

async fn handle(state: &AppState, method: &str, user: &str) -> Result<DeleteResponse, ApiError> {
    let validator = validator_for(state, method)?;
    let user = user_id(user)?;

    let removed = validator.delete(&user).await?;
    Ok(DeleteResponse { removed })
}

use actix_web::{web, HttpResponse};
use chrono::Utc;

use crate::app::AppState;
use crate::dto::HealthResponse;

/// Handler for GET /health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        service: "credverify-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        methods: state
            .registry
            .methods()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}

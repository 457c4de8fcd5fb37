//! Application state and factory
//!
//! This module holds the state shared by all workers and provides the
//! factory for creating the Actix-web application.

use std::sync::Arc;

use actix_web::{
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    error::{InternalError, JsonPayloadError},
    web, App, Error, HttpRequest, HttpResponse,
};

use cv_core::ValidatorRegistry;
use cv_shared::{error_codes, ErrorResponse, Language};

use crate::handlers::request_language;
use crate::routes::{credentials, health::health_check};

/// Default JSON body limit in bytes
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 16 * 1024;

/// State shared by every request handler
pub struct AppState {
    pub registry: Arc<ValidatorRegistry>,
    pub max_payload_size: usize,
}

impl AppState {
    pub fn new(registry: Arc<ValidatorRegistry>) -> Self {
        Self {
            registry,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
        }
    }

    pub fn with_max_payload_size(mut self, max_payload_size: usize) -> Self {
        self.max_payload_size = max_payload_size;
        self
    }
}

/// Mount `/health`, the `/api/v1` routes and the JSON 404 fallback
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .service(web::scope("/api/v1").configure(credentials::configure))
        .default_service(web::route().to(not_found));
}

/// Create and configure the application with its state
pub fn create_app(
    state: web::Data<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = Error,
        InitError = (),
    >,
> {
    let json_config = web::JsonConfig::default()
        .limit(state.max_payload_size)
        .error_handler(json_error_handler);

    App::new()
        .app_data(state)
        .app_data(json_config)
        .configure(configure)
}

/// Malformed or oversized JSON bodies answer with the standard error body
fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> Error {
    let lang = request_language(req);
    let message = match lang {
        Language::English => "Malformed JSON request body",
        Language::Chinese => "请求体JSON格式错误",
    };
    let response = HttpResponse::BadRequest().json(
        ErrorResponse::new(error_codes::BAD_REQUEST, message).add_detail("reason", err.to_string()),
    );
    InternalError::from_response(err, response).into()
}

async fn not_found(req: HttpRequest) -> HttpResponse {
    let message = match request_language(&req) {
        Language::English => "The requested resource was not found",
        Language::Chinese => "请求的资源不存在",
    };
    HttpResponse::NotFound().json(ErrorResponse::new(error_codes::NOT_FOUND, message))
}

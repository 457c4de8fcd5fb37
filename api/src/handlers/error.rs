//! Conversion of request and engine failures into localized HTTP responses

use actix_web::{
    http::{header, StatusCode},
    HttpRequest, HttpResponse,
};
use thiserror::Error;

use cv_core::{DomainError, VerificationError};
use cv_shared::{error_codes, ErrorResponse, Language};

/// Failures of an API call
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Malformed {field}: {reason}")]
    Malformed { field: &'static str, reason: String },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Detect language preference from the Accept-Language header
pub fn request_language(req: &HttpRequest) -> Language {
    req.headers()
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok())
        .map(Language::from_accept_language)
        .unwrap_or_default()
}

/// Helper function to get localized message
fn get_localized_message(lang: Language, en: &str, zh: &str) -> String {
    match lang {
        Language::English => en.to_string(),
        Language::Chinese => zh.to_string(),
    }
}

/// HTTP status for an engine failure
pub fn verification_status(error: &VerificationError) -> StatusCode {
    match error {
        VerificationError::InvalidFormat { .. } => StatusCode::BAD_REQUEST,
        VerificationError::AlreadyClaimed => StatusCode::CONFLICT,
        VerificationError::AlreadyVerified => StatusCode::CONFLICT,
        VerificationError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        VerificationError::DeliveryFailed { .. } => StatusCode::BAD_GATEWAY,
        VerificationError::Expired => StatusCode::GONE,
        VerificationError::NotFound => StatusCode::NOT_FOUND,
        VerificationError::InvalidResponse { .. } => StatusCode::BAD_REQUEST,
        VerificationError::MaxAttemptsExceeded => StatusCode::TOO_MANY_REQUESTS,
        VerificationError::NotVerified => StatusCode::UNPROCESSABLE_ENTITY,
        VerificationError::StoreUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        VerificationError::NotInitialized => StatusCode::SERVICE_UNAVAILABLE,
        VerificationError::AlreadyInitialized => StatusCode::INTERNAL_SERVER_ERROR,
        VerificationError::UnknownMethod { .. } => StatusCode::NOT_FOUND,
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Malformed { .. } => StatusCode::BAD_REQUEST,
            ApiError::Domain(DomainError::Validation { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Domain(DomainError::Verification(e)) => verification_status(e),
            ApiError::Domain(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Localized error body
    pub fn to_error_response(&self, lang: Language) -> ErrorResponse {
        match self {
            ApiError::Validation(errors) => {
                let mut response = ErrorResponse::new(
                    error_codes::VALIDATION_ERROR,
                    get_localized_message(lang, "Request validation failed", "请求参数校验失败"),
                );
                for (field, field_errors) in errors.field_errors() {
                    let codes: Vec<String> =
                        field_errors.iter().map(|e| e.code.to_string()).collect();
                    response = response.add_detail(field, codes);
                }
                response
            }
            ApiError::Malformed { field, .. } => ErrorResponse::new(
                error_codes::BAD_REQUEST,
                get_localized_message(
                    lang,
                    &format!("Malformed field: {}", field),
                    &format!("字段格式错误：{}", field),
                ),
            )
            .add_detail("field", field),
            ApiError::Domain(DomainError::Validation { message }) => ErrorResponse::new(
                error_codes::VALIDATION_ERROR,
                get_localized_message(lang, message, "请求参数无效"),
            ),
            ApiError::Domain(DomainError::Verification(error)) => {
                let response = ErrorResponse::new(error.code(), error.localized(lang));
                match error {
                    VerificationError::RateLimited {
                        retry_after_seconds,
                    } => response.add_detail("retry_after_seconds", retry_after_seconds),
                    VerificationError::InvalidResponse { remaining_attempts } => {
                        response.add_detail("remaining_attempts", remaining_attempts)
                    }
                    _ => response,
                }
            }
            ApiError::Domain(DomainError::Configuration { .. }) => ErrorResponse::new(
                error_codes::CONFIGURATION_ERROR,
                get_localized_message(lang, "Service is misconfigured", "服务配置错误"),
            ),
            ApiError::Domain(DomainError::Internal { .. }) => ErrorResponse::new(
                error_codes::INTERNAL_ERROR,
                get_localized_message(lang, "An internal error occurred", "发生内部错误"),
            ),
        }
    }

    /// Build the HTTP response, logging server-side failures
    pub fn to_response(&self, lang: Language) -> HttpResponse {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, event = "api_error", "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, event = "api_rejected", "Request rejected");
        }

        let mut builder = HttpResponse::build(status);
        if let ApiError::Domain(DomainError::Verification(VerificationError::RateLimited {
            retry_after_seconds,
        })) = self
        {
            builder.insert_header((header::RETRY_AFTER, retry_after_seconds.to_string()));
        }
        builder.json(self.to_error_response(lang))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn verification(error: VerificationError) -> ApiError {
        ApiError::Domain(error.into())
    }

    #[test]
    fn test_request_language() {
        let req = TestRequest::default()
            .insert_header((header::ACCEPT_LANGUAGE, "zh-CN,zh;q=0.9,en;q=0.8"))
            .to_http_request();
        assert_eq!(request_language(&req), Language::Chinese);

        let req = TestRequest::default().to_http_request();
        assert_eq!(request_language(&req), Language::English);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            verification(VerificationError::AlreadyClaimed).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            verification(VerificationError::UnknownMethod {
                method: "fax".to_string()
            })
            .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            verification(VerificationError::StoreUnavailable {
                message: "down".to_string()
            })
            .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::Domain(DomainError::Validation {
                message: "bad".to_string()
            })
            .status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_rate_limited_body_and_header() {
        let error = verification(VerificationError::RateLimited {
            retry_after_seconds: 42,
        });

        let body = error.to_error_response(Language::Chinese);
        assert_eq!(body.error, error_codes::RATE_LIMITED);
        assert!(body.message.contains("请求过于频繁"));
        assert_eq!(body.details.unwrap()["retry_after_seconds"], 42);

        let response = error.to_response(Language::English);
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "42");
    }

    #[test]
    fn test_internal_details_stay_private() {
        let error = verification(VerificationError::DeliveryFailed {
            reason: "twilio: 21610 unsubscribed".to_string(),
        });
        let body = error.to_error_response(Language::English);
        assert_eq!(body.error, error_codes::DELIVERY_FAILED);
        assert!(!body.message.contains("21610"));
    }
}

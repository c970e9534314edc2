use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Service-wide error taxonomy.
///
/// Every variant maps to a stable machine-readable `code` plus a
/// human-readable message in the HTTP response body.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(anyhow::Error),

    #[error("Forbidden: {0}")]
    Forbidden(anyhow::Error),

    #[error("Authentication error: {0}")]
    AuthError(anyhow::Error),

    #[error("Conflict: {0}")]
    Conflict(anyhow::Error),

    #[error("Business rule violation: {0}")]
    BusinessRule(anyhow::Error),

    #[error("Token invalid: {0}")]
    TokenInvalid(anyhow::Error),

    #[error("External service failure: {0}")]
    ExternalService(String),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            code: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<String>,
        }

        let (status, code, error_message, details) = match self {
            AppError::ValidationError(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_failure",
                "Validation error".to_string(),
                Some(err.to_string()),
            ),
            AppError::BadRequest(err) => (
                StatusCode::BAD_REQUEST,
                "validation_failure",
                err.to_string(),
                None,
            ),
            AppError::NotFound(err) => {
                (StatusCode::NOT_FOUND, "not_found", err.to_string(), None)
            }
            AppError::Unauthorized(err) => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                err.to_string(),
                None,
            ),
            AppError::Forbidden(err) => {
                (StatusCode::FORBIDDEN, "forbidden", err.to_string(), None)
            }
            AppError::AuthError(err) => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                err.to_string(),
                None,
            ),
            AppError::Conflict(err) => {
                (StatusCode::CONFLICT, "conflict", err.to_string(), None)
            }
            AppError::BusinessRule(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "business_rule_violation",
                err.to_string(),
                None,
            ),
            AppError::TokenInvalid(err) => (
                StatusCode::UNAUTHORIZED,
                "token_invalid",
                err.to_string(),
                None,
            ),
            AppError::ExternalService(msg) => (
                StatusCode::BAD_GATEWAY,
                "external_service_failure",
                msg,
                None,
            ),
            AppError::InternalError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error".to_string(),
                Some(err.to_string()),
            ),
            AppError::InvalidToken(err) => (
                StatusCode::UNAUTHORIZED,
                "token_invalid",
                "Invalid token".to_string(),
                Some(err.to_string()),
            ),
            AppError::ConfigError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "config_error",
                "Configuration error".to_string(),
                Some(err.to_string()),
            ),
        };

        (
            status,
            Json(ErrorResponse {
                error: error_message,
                code,
                details,
            }),
        )
            .into_response()
    }
}

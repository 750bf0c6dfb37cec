use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::transform::failure::TransformError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Transform(e) => transform_status(e),
        };

        // Transformation messages are written for the end user; pass them through.
        let message = match &self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Transform(e) => e.to_string(),
        };

        if status.is_server_error() {
            tracing::error!("{code}: {message}");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

fn transform_status(err: &TransformError) -> (StatusCode, &'static str) {
    match err {
        TransformError::NotInitialized => (StatusCode::PRECONDITION_REQUIRED, "NOT_INITIALIZED"),
        TransformError::EmptyInput => (StatusCode::BAD_REQUEST, "EMPTY_INPUT"),
        TransformError::Initialization(_) => (StatusCode::BAD_REQUEST, "INITIALIZATION_ERROR"),
        TransformError::InvalidCredential => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIAL"),
        TransformError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
        TransformError::ContentTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "CONTENT_TOO_LARGE"),
        TransformError::ModelUnavailable => (StatusCode::BAD_GATEWAY, "MODEL_UNAVAILABLE"),
        TransformError::Failed { .. } => (StatusCode::BAD_GATEWAY, "TRANSFORMATION_FAILED"),
    }
}

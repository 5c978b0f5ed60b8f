//! API error type with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::DxError;

/// Error response body: `{ "error": { "code", "message" } }`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("{0}")]
    InsufficientData(String),
    #[error("Import failed: {0}")]
    Import(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Model not trained")]
    ModelNotTrained,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail),
            ApiError::InsufficientData(detail) => {
                (StatusCode::BAD_REQUEST, "INSUFFICIENT_DATA", detail)
            }
            ApiError::Import(detail) => (StatusCode::BAD_REQUEST, "IMPORT_FAILED", detail),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail),
            ApiError::ModelNotTrained => (
                StatusCode::SERVICE_UNAVAILABLE,
                "MODEL_NOT_TRAINED",
                DxError::ModelNotTrained.to_string(),
            ),
            ApiError::Internal(detail) => {
                tracing::error!("API internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<DxError> for ApiError {
    fn from(err: DxError) -> Self {
        match err {
            DxError::InsufficientData { .. } => ApiError::InsufficientData(err.to_string()),
            DxError::ModelNotTrained => ApiError::ModelNotTrained,
            DxError::Validation(detail) | DxError::Encoding(detail) => ApiError::BadRequest(detail),
            DxError::Import(e) => ApiError::Import(e.to_string()),
            DxError::NotFound(detail) => ApiError::NotFound(detail),
            DxError::NarrativeUnavailable(_)
            | DxError::Storage(_)
            | DxError::Io(_)
            | DxError::Serialization(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("worker task failed: {err}"))
    }
}

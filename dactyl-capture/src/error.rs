//! Error types for dactyl-capture
//!
//! The service boundary knows four kinds of failure. Each maps to a stable
//! code and an HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::archive::ArchiveError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Person, fingerprint type or comparison set missing (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Unique constraint violated or input rejected on create (400)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Archive upload/download/delete failed (502)
    #[error("Archive transfer failed: {0}")]
    TransferFailure(String),

    /// Anything else (500); detail is logged, never returned
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ApiError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::TransferFailure(_) => "TRANSFER_FAILURE",
            ApiError::Unexpected(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::TransferFailure(_) => StatusCode::BAD_GATEWAY,
            ApiError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<dactyl_common::Error> for ApiError {
    fn from(err: dactyl_common::Error) -> Self {
        if err.is_unique_violation() {
            return ApiError::Conflict(err.to_string());
        }
        match err {
            dactyl_common::Error::NotFound(msg) => ApiError::NotFound(msg),
            dactyl_common::Error::InvalidInput(msg) => ApiError::Conflict(msg),
            other => ApiError::Unexpected(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        dactyl_common::Error::from(err).into()
    }
}

impl From<ArchiveError> for ApiError {
    fn from(err: ArchiveError) -> Self {
        ApiError::TransferFailure(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = match self {
            ApiError::Unexpected(detail) => {
                tracing::error!("Unexpected error: {}", detail);
                "Internal server error".to_string()
            }
            ApiError::NotFound(msg) | ApiError::Conflict(msg) | ApiError::TransferFailure(msg) => msg,
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers and services
pub type ApiResult<T> = Result<T, ApiError>;

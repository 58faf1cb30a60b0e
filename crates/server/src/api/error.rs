//! Mapping of engine failures onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dropsort_core::{ErrorCategory, FolderError, LedgerError, OperationResult};
use serde::Serialize;

/// HTTP status for an error category.
pub fn status_for(category: ErrorCategory) -> StatusCode {
    match category {
        ErrorCategory::Validation => StatusCode::BAD_REQUEST,
        ErrorCategory::NotFound => StatusCode::NOT_FOUND,
        ErrorCategory::Conflict => StatusCode::CONFLICT,
        ErrorCategory::NonRevertible => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCategory::Io => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub category: ErrorCategory,
}

/// An error returned from a handler.
#[derive(Debug)]
pub struct ApiError {
    pub category: ErrorCategory,
    pub message: String,
}

impl ApiError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::NotFound, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            category: self.category,
        };
        (status_for(self.category), Json(body)).into_response()
    }
}

impl From<FolderError> for ApiError {
    fn from(e: FolderError) -> Self {
        Self::new(e.category(), e.to_string())
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        Self::new(e.category(), e.to_string())
    }
}

/// Result objects are returned as-is, with the status of their category.
pub fn operation_response(result: OperationResult) -> Response {
    let status = match result.error {
        Some(category) if !result.success => status_for(category),
        _ => StatusCode::OK,
    };
    (status, Json(result)).into_response()
}

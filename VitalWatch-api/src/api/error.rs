use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use vital_watch_domain::services::ServiceError;

/// Error response format for API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error type/code - machine-readable identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    pub fn validation_error(message: impl Into<String>, details: Option<serde_json::Value>) -> Self {
        Self {
            details,
            ..Self::new("validation_error", message)
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("bad_request", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("forbidden", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("conflict", message)
    }

    /// Generic 500; the cause is logged, not returned
    pub fn internal_error() -> Self {
        Self::new("internal_error", "An unexpected error occurred")
    }

    pub fn status(&self) -> StatusCode {
        match self.error.as_str() {
            "validation_error" | "bad_request" => StatusCode::BAD_REQUEST,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "forbidden" => StatusCode::FORBIDDEN,
            "not_found" => StatusCode::NOT_FOUND,
            "conflict" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<ServiceError> for ErrorResponse {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(m) => Self::validation_error(m, None),
            ServiceError::NotFound(m) => Self::not_found(m),
            ServiceError::Forbidden(m) => Self::forbidden(m),
            ServiceError::Conflict(m) => Self::conflict(m),
            ServiceError::Unauthorized(m) => Self::unauthorized(m),
            other @ (ServiceError::Repository(_) | ServiceError::Delivery(_) | ServiceError::Internal(_)) => {
                error!("Request failed: {}", other);
                Self::internal_error()
            }
        }
    }
}

/// Result type for handlers
pub type ApiResult<T> = Result<T, ErrorResponse>;

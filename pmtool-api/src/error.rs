/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// Handlers return `Result<T, ApiError>`; engine failures convert with `?`
/// and keep their classification:
///
/// | Engine error       | Status | `error` code        |
/// |--------------------|--------|---------------------|
/// | `TenantUnresolved` | 400    | `tenant_unresolved` |
/// | `Validation`       | 422    | `validation_error`  |
/// | `NotFound`         | 404    | `not_found`         |
/// | `Conflict`         | 409    | `conflict`          |
/// | `Store`            | 500    | `internal_error`    |
///
/// # Example
///
/// ```
/// use pmtool_api::error::ApiError;
/// use pmtool_shared::engine::error::{EngineError, Entity};
///
/// let err: ApiError = EngineError::NotFound(Entity::Project).into();
/// assert_eq!(err.to_string(), "Not found: Project not found");
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pmtool_shared::engine::error::EngineError;
use serde::{Deserialize, Serialize};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad request (400), e.g. a malformed operation descriptor
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Bad request (400): the operation needs a tenant and none was resolved
    #[error("Tenant unresolved: {0}")]
    TenantUnresolved(String),

    /// Not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict (409) - duplicate slug or project name
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unprocessable entity (422) - validation errors
    #[error("Validation failed: {message}")]
    ValidationError {
        message: String,
        details: Vec<ValidationErrorDetail>,
    },

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "not_found")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::TenantUnresolved(msg) => {
                (StatusCode::BAD_REQUEST, "tenant_unresolved", msg, None)
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError { message, details } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                message,
                Some(details),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert engine errors to API errors
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::TenantUnresolved { .. } => ApiError::TenantUnresolved(err.to_string()),
            EngineError::Validation(rule) => ApiError::ValidationError {
                message: rule.message.clone(),
                details: vec![ValidationErrorDetail {
                    field: rule.field,
                    message: rule.message,
                }],
            },
            EngineError::NotFound(_) => ApiError::NotFound(err.to_string()),
            EngineError::Conflict(_) => ApiError::Conflict(err.to_string()),
            EngineError::Store(store) => ApiError::InternalError(store.to_string()),
        }
    }
}

pub mod codes;
pub mod handlers;
pub mod responses;

pub use codes::ErrorCode;

use crate::auth::AuthError;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Standard error response structure.
///
/// Every error response has this shape:
/// - `code`: Integer error code for logging/monitoring (e.g., 1008)
/// - `error`: Machine-readable error identifier (e.g., "CONFLICT")
/// - `message`: Human-readable error message
/// - `details`: Optional additional error details (e.g., validation errors)
///
/// # JSON Example
///
/// ```json
/// {
///   "code": 1008,
///   "error": "CONFLICT",
///   "message": "User 42 was modified concurrently"
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Integer error code for logging and monitoring
    pub code: i32,
    /// Machine-readable error identifier for programmatic handling
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Optional structured error details (e.g., validation field errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            error: code.as_str().to_string(),
            message: message.into(),
            details: None,
        }
    }
}

/// Application error type that can be converted to HTTP responses.
///
/// Domain crates convert their own errors into this type; the response body
/// is always an [`ErrorResponse`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken => Self::Unauthorized("No bearer token provided".to_string()),
            // Token details stay in the debug log
            AuthError::InvalidToken(_) => Self::Unauthorized("Invalid token".to_string()),
            AuthError::Config(msg) => Self::InternalServerError(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details, code) = match self {
            AppError::Database(e) => map_db_error(&e),
            AppError::JsonExtractorRejection(e) => {
                tracing::warn!(
                    error_code = ErrorCode::JsonExtraction.code(),
                    "JSON extraction error: {:?}",
                    e
                );
                (e.status(), e.body_text(), None, ErrorCode::JsonExtraction)
            }
            AppError::ValidationError(e) => {
                tracing::info!(
                    error_code = ErrorCode::ValidationError.code(),
                    "Validation error: {:?}",
                    e
                );
                (
                    StatusCode::BAD_REQUEST,
                    ErrorCode::ValidationError.default_message().to_string(),
                    serde_json::to_value(&e).ok(),
                    ErrorCode::ValidationError,
                )
            }
            AppError::BadRequest(msg) => {
                tracing::info!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, msg, None, ErrorCode::BadRequest)
            }
            AppError::Unauthorized(msg) => {
                tracing::info!("Unauthorized: {}", msg);
                (StatusCode::UNAUTHORIZED, msg, None, ErrorCode::Unauthorized)
            }
            AppError::NotFound(msg) => {
                tracing::info!(
                    error_code = ErrorCode::NotFound.code(),
                    "Not found: {}",
                    msg
                );
                (StatusCode::NOT_FOUND, msg, None, ErrorCode::NotFound)
            }
            AppError::Conflict(msg) => {
                tracing::info!("Conflict: {}", msg);
                (StatusCode::CONFLICT, msg, None, ErrorCode::Conflict)
            }
            AppError::InternalServerError(msg) => {
                tracing::error!(
                    error_code = ErrorCode::InternalError.code(),
                    "Internal server error: {}",
                    msg
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::InternalError.default_message().to_string(),
                    None,
                    ErrorCode::InternalError,
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code.code(),
            error: code.as_str().to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Maps a SeaORM error to response components.
///
/// Connection problems become 503 so load balancers can back off; everything
/// else is a 500 with a generic message. The driver error is only logged.
fn map_db_error(error: &DbErr) -> (StatusCode, String, Option<serde_json::Value>, ErrorCode) {
    let code = match error {
        DbErr::RecordNotFound(_) => {
            tracing::info!(
                error_code = ErrorCode::DatabaseNotFound.code(),
                "Database record not found: {}",
                error
            );
            return (
                StatusCode::NOT_FOUND,
                ErrorCode::DatabaseNotFound.default_message().to_string(),
                None,
                ErrorCode::DatabaseNotFound,
            );
        }
        DbErr::ConnectionAcquire(_) => ErrorCode::DatabasePoolTimeout,
        DbErr::Conn(_) => ErrorCode::DatabaseConnection,
        DbErr::Exec(_) | DbErr::Query(_) => ErrorCode::DatabaseQuery,
        _ => ErrorCode::DatabaseUnhandled,
    };

    let status = match code {
        ErrorCode::DatabasePoolTimeout | ErrorCode::DatabaseConnection => {
            tracing::warn!(error_code = code.code(), "Database unavailable: {:?}", error);
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => {
            tracing::error!(error_code = code.code(), "Database error: {:?}", error);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, code.default_message().to_string(), None, code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::RuntimeErr;

    #[test]
    fn test_conflict_maps_to_409() {
        let response = AppError::Conflict("User 1 was modified concurrently".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_auth_errors_map_to_401() {
        let response = AppError::from(AuthError::MissingToken).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_db_connection_error_is_503() {
        let err = DbErr::Conn(RuntimeErr::Internal("connection refused".into()));
        let (status, _, _, code) = map_db_error(&err);
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(code, ErrorCode::DatabaseConnection);
    }

    #[test]
    fn test_db_query_error_is_500_without_driver_details() {
        let err = DbErr::Exec(RuntimeErr::Internal("syntax error at or near".into()));
        let (status, message, _, code) = map_db_error(&err);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, ErrorCode::DatabaseQuery);
        assert!(!message.contains("syntax"));
    }

    #[test]
    fn test_record_not_found_is_404() {
        let err = DbErr::RecordNotFound("users".into());
        let (status, _, _, _) = map_db_error(&err);
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_error_hides_message() {
        let response = AppError::InternalServerError("secret detail".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

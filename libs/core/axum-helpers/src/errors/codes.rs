//! Type-safe error codes for API responses.
//!
//! Each error code carries:
//! - String representation for client consumption (e.g., "VALIDATION_ERROR")
//! - Integer code for logging and monitoring (e.g., 1001)
//! - Default human-readable message
//!
//! # Example
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! let code = ErrorCode::ValidationError;
//! assert_eq!(code.as_str(), "VALIDATION_ERROR");
//! assert_eq!(code.code(), 1001);
//! assert_eq!(code.default_message(), "Request validation failed");
//! ```

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standardized error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors (1000-1999)
    /// Request validation failed
    ValidationError,

    /// JSON extraction from request body failed
    JsonExtraction,

    /// Requested resource was not found
    NotFound,

    /// Authentication credentials are missing or invalid
    Unauthorized,

    /// Request conflicts with the current resource state
    Conflict,

    /// Request is malformed or violates a business rule
    BadRequest,

    /// An unexpected internal server error occurred
    InternalError,

    // Database errors (2000-2999)
    /// Database query returned no results
    DatabaseNotFound,

    /// Could not reach the database
    DatabaseConnection,

    /// Statement failed during execution
    DatabaseQuery,

    /// No connection could be acquired from the pool
    DatabasePoolTimeout,

    /// Unhandled database error
    DatabaseUnhandled,
}

impl ErrorCode {
    /// SCREAMING_SNAKE_CASE identifier clients can match on.
    ///
    /// ```rust
    /// use axum_helpers::errors::ErrorCode;
    ///
    /// assert_eq!(ErrorCode::Conflict.as_str(), "CONFLICT");
    /// assert_eq!(ErrorCode::NotFound.as_str(), "NOT_FOUND");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::JsonExtraction => "JSON_EXTRACTION",
            Self::NotFound => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Conflict => "CONFLICT",
            Self::BadRequest => "BAD_REQUEST",
            Self::InternalError => "INTERNAL_ERROR",
            Self::DatabaseNotFound => "DATABASE_NOT_FOUND",
            Self::DatabaseConnection => "DATABASE_CONNECTION",
            Self::DatabaseQuery => "DATABASE_QUERY",
            Self::DatabasePoolTimeout => "DATABASE_POOL_TIMEOUT",
            Self::DatabaseUnhandled => "DATABASE_UNHANDLED",
        }
    }

    /// Integer code for structured logs.
    ///
    /// Ranges:
    /// - 1000-1999: Client errors
    /// - 2000-2999: Database errors
    pub fn code(&self) -> i32 {
        match self {
            Self::ValidationError => 1001,
            Self::JsonExtraction => 1003,
            Self::NotFound => 1004,
            Self::InternalError => 1005,
            Self::Unauthorized => 1006,
            Self::Conflict => 1008,
            Self::BadRequest => 1010,

            Self::DatabaseNotFound => 2001,
            Self::DatabaseConnection => 2002,
            Self::DatabaseQuery => 2003,
            Self::DatabasePoolTimeout => 2013,
            Self::DatabaseUnhandled => 2099,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            Self::ValidationError => "Request validation failed",
            Self::JsonExtraction => "Failed to parse request body",
            Self::NotFound => "Resource not found",
            Self::Unauthorized => "Authentication required",
            Self::Conflict => "Resource was modified concurrently",
            Self::BadRequest => "Bad request",
            Self::InternalError => "An internal server error occurred",
            Self::DatabaseNotFound => "Database record not found",
            Self::DatabaseConnection => "Database connection error",
            Self::DatabaseQuery => "Database error occurred",
            Self::DatabasePoolTimeout => "Database connection pool timed out",
            Self::DatabaseUnhandled => "Unhandled database error",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

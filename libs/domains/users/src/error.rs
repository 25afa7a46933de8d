use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use sea_orm::DbErr;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum UserError {
    /// Business rule or input violation; nothing was written
    #[error("{0}")]
    Validation(String),

    #[error("User not found: {0}")]
    NotFound(i64),

    #[error("User not found with email: {0}")]
    EmailNotFound(String),

    /// Optimistic lock failure: the row changed since it was read
    #[error("User {0} was modified concurrently")]
    Conflict(i64),

    #[error("Store error: {0}")]
    Store(#[from] DbErr),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl UserError {
    pub fn duplicate_email(email: &str) -> Self {
        Self::Validation(format!("Email already exists: {}", email))
    }
}

impl From<ValidationErrors> for UserError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Validation(msg) => AppError::BadRequest(msg),
            e @ (UserError::NotFound(_) | UserError::EmailNotFound(_)) => {
                AppError::NotFound(e.to_string())
            }
            e @ UserError::Conflict(_) => AppError::Conflict(e.to_string()),
            UserError::Store(e) => AppError::Database(e),
            UserError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_codes() {
        let cases = [
            (UserError::duplicate_email("a@b.com"), StatusCode::BAD_REQUEST),
            (UserError::NotFound(1), StatusCode::NOT_FOUND),
            (UserError::EmailNotFound("a@b.com".into()), StatusCode::NOT_FOUND),
            (UserError::Conflict(1), StatusCode::CONFLICT),
            (UserError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            UserError::duplicate_email("ana@example.com").to_string(),
            "Email already exists: ana@example.com"
        );
        assert_eq!(UserError::NotFound(42).to_string(), "User not found: 42");
    }
}

//! Errors surfaced by pool setup and readiness probes

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    Postgres(#[from] sea_orm::DbErr),

    /// The pool could not hand out a live connection
    #[error("Pool unavailable: {0}")]
    Unavailable(String),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_message() {
        let err = DatabaseError::Unavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "Pool unavailable: connection refused");
    }
}

// Error handling for the recipe data-access layer

use thiserror::Error;

/// PostgreSQL SQLSTATE for `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL SQLSTATE for `foreign_key_violation`
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Database errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Database health check failed: {0}")]
    HealthCheckFailed(String),

    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate key violation: {0}")]
    Conflict(String),

    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}

/// The three outcomes a caller has to tell apart when picking a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    PersistenceFailure,
}

impl ErrorKind {
    /// Label value used in metrics and logs
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::PersistenceFailure => "persistence_failure",
        }
    }
}

impl DatabaseError {
    /// Classify the error for the service layer
    pub fn kind(&self) -> ErrorKind {
        match self {
            DatabaseError::NotFound(_) => ErrorKind::NotFound,
            DatabaseError::Conflict(_) => ErrorKind::Conflict,
            _ => ErrorKind::PersistenceFailure,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Map a SQLSTATE code and message to an error
    pub(crate) fn from_code(code: Option<&str>, message: &str) -> Self {
        match code {
            Some(UNIQUE_VIOLATION) => DatabaseError::Conflict(message.to_string()),
            Some(FOREIGN_KEY_VIOLATION) => DatabaseError::ForeignKeyViolation(message.to_string()),
            _ => DatabaseError::QueryFailed(message.to_string()),
        }
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code();
                DatabaseError::from_code(code.as_deref(), db_err.message())
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_is_conflict() {
        let err = DatabaseError::from_code(
            Some("23505"),
            "duplicate key value violates unique constraint \"users_username_key\"",
        );
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.is_conflict());
        assert!(err.to_string().contains("users_username_key"));
        assert_eq!(err.kind().as_str(), "conflict");
    }

    #[test]
    fn test_foreign_key_violation_is_persistence_failure() {
        let err = DatabaseError::from_code(Some("23503"), "violates foreign key constraint");
        assert!(matches!(err, DatabaseError::ForeignKeyViolation(_)));
        assert_eq!(err.kind(), ErrorKind::PersistenceFailure);
    }

    #[test]
    fn test_interval_cast_failure_is_persistence_failure() {
        // invalid_datetime_format
        let err = DatabaseError::from_code(
            Some("22007"),
            "invalid input syntax for type interval: \"soon\"",
        );
        assert_eq!(err.kind(), ErrorKind::PersistenceFailure);
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DatabaseError = sqlx::Error::RowNotFound.into();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_other_sqlx_errors_are_persistence_failures() {
        let err: DatabaseError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DatabaseError::QueryFailed(_)));
        assert_eq!(err.kind(), ErrorKind::PersistenceFailure);
    }
}

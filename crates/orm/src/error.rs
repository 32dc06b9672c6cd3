//! Error types for the persistence layer

use thiserror::Error;

/// Result type alias for repository operations
pub type ModelResult<T> = Result<T, ModelError>;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Error types for repository operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    /// Database connection or query error
    #[error("Database error: {0}")]
    Database(String),

    /// Record not found in the named table
    #[error("Record not found in table '{0}'")]
    NotFound(String),

    /// A unique constraint rejected the write (SQLSTATE 23505)
    #[error("Duplicate value violates unique constraint{}", quoted(.constraint))]
    UniqueViolation { constraint: Option<String> },

    /// A foreign key rejected the write (SQLSTATE 23503)
    #[error("Referenced record does not exist{}", quoted(.constraint))]
    ForeignKeyViolation { constraint: Option<String> },

    /// Connection pool error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// Rejected query input (unknown column, bad operator, ...)
    #[error("Query error: {0}")]
    Query(String),
}

fn quoted(constraint: &Option<String>) -> String {
    constraint
        .as_deref()
        .map(|name| format!(" '{}'", name))
        .unwrap_or_default()
}

impl ModelError {
    pub fn not_found(table: impl Into<String>) -> Self {
        ModelError::NotFound(table.into())
    }

    pub fn query(message: impl Into<String>) -> Self {
        ModelError::Query(message.into())
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, ModelError::UniqueViolation { .. })
    }

    /// Name of the violated unique constraint, if the database reported one
    pub fn violated_constraint(&self) -> Option<&str> {
        match self {
            ModelError::UniqueViolation { constraint }
            | ModelError::ForeignKeyViolation { constraint } => constraint.as_deref(),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => ModelError::NotFound("record".to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                ModelError::Connection(err.to_string())
            }
            sqlx::Error::Database(db) => {
                let constraint = db.constraint().map(str::to_string);
                match db.code().as_deref() {
                    Some(UNIQUE_VIOLATION) => ModelError::UniqueViolation { constraint },
                    Some(FOREIGN_KEY_VIOLATION) => ModelError::ForeignKeyViolation { constraint },
                    _ => ModelError::Database(err.to_string()),
                }
            }
            _ => ModelError::Database(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for ModelError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        ModelError::Migration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = ModelError::from(sqlx::Error::RowNotFound);
        assert_eq!(err, ModelError::NotFound("record".to_string()));
    }

    #[test]
    fn test_pool_timeout_maps_to_connection() {
        assert!(matches!(
            ModelError::from(sqlx::Error::PoolTimedOut),
            ModelError::Connection(_)
        ));
    }

    #[test]
    fn test_unique_violation_display() {
        let err = ModelError::UniqueViolation {
            constraint: Some("users_email_key".to_string()),
        };
        assert!(err.is_unique_violation());
        assert_eq!(err.violated_constraint(), Some("users_email_key"));
        assert_eq!(
            err.to_string(),
            "Duplicate value violates unique constraint 'users_email_key'"
        );
    }

    #[test]
    fn test_not_found_display() {
        assert_eq!(
            ModelError::not_found("books").to_string(),
            "Record not found in table 'books'"
        );
    }
}

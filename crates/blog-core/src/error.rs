//! Domain-level error types.

use thiserror::Error;

/// Domain errors - business rule failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Validation failed on {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("Duplicate entity: {0}")]
    Duplicate(String),
}

impl DomainError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl From<DomainError> for RepoError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation { .. } => RepoError::Validation(err.to_string()),
            DomainError::Duplicate(msg) => RepoError::Constraint(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_maps_to_constraint() {
        let err: RepoError = DomainError::Duplicate("tag 'rust' already exists".into()).into();
        assert!(matches!(err, RepoError::Constraint(msg) if msg == "tag 'rust' already exists"));
    }

    #[test]
    fn test_validation_keeps_field_in_message() {
        let err: RepoError = DomainError::validation("title", "must not be empty").into();
        match err {
            RepoError::Validation(msg) => assert!(msg.contains("title")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

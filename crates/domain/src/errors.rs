//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Error)]
pub enum DomainError {
    /// A parameter is outside its accepted range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Entity not found
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    /// The target is in a state the operation cannot act on
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// A textual value could not be parsed into a domain type
    #[error("Unrecognized {kind}: {value}")]
    Unrecognized { kind: &'static str, value: String },
}

impl DomainError {
    /// Create a not found error
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_creates_correct_error() {
        let err = DomainError::not_found("Backup", "mysql-bin.000003.backup");
        match err {
            DomainError::NotFound { entity_type, id } => {
                assert_eq!(entity_type, "Backup");
                assert_eq!(id, "mysql-bin.000003.backup");
            },
            _ => unreachable!("Expected NotFound error"),
        }
    }

    #[test]
    fn not_found_error_message_is_correct() {
        let err = DomainError::not_found("Binlog file", "/var/lib/mysql/mysql-bin.000001");
        assert_eq!(
            err.to_string(),
            "Binlog file not found: /var/lib/mysql/mysql-bin.000001"
        );
    }

    #[test]
    fn invalid_argument_error_message() {
        let err = DomainError::invalid("percentage must be within 1..=100, got 0");
        assert_eq!(
            err.to_string(),
            "Invalid argument: percentage must be within 1..=100, got 0"
        );
    }

    #[test]
    fn precondition_failed_error_message() {
        let err = DomainError::PreconditionFailed("file too small".to_string());
        assert_eq!(err.to_string(), "Precondition failed: file too small");
    }

    #[test]
    fn unrecognized_error_message() {
        let err = DomainError::Unrecognized {
            kind: "fault kind",
            value: "flood".to_string(),
        };
        assert_eq!(err.to_string(), "Unrecognized fault kind: flood");
    }
}

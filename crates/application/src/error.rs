//! Application-level errors

use std::io;
use std::path::Path;

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(String),

    /// The SQL execution path reported a failure
    #[error("Database error: {0}")]
    Database(String),

    /// A firewall, traffic-shaping or process-control command failed
    #[error("External tool error: {0}")]
    ExternalTool(String),

    /// Something did not become ready within its bounded retries
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of an [`ApplicationError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad percentage, size, count or other parameter
    InvalidArgument,
    /// Target is in an unsupported state
    PreconditionFailed,
    /// Missing file or backup
    NotFound,
    /// Filesystem failure
    Io,
    /// SQL execution failure
    Database,
    /// Firewall, traffic-shaping or process-control failure
    ExternalTool,
    /// Bounded wait expired
    Timeout,
    /// Anything else
    Internal,
}

impl ApplicationError {
    /// Map a filesystem error on `path`, keeping "not found" distinct
    pub fn io(path: &Path, err: &io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            DomainError::not_found("File", path.display().to_string()).into()
        } else {
            Self::Io(format!("{}: {err}", path.display()))
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(DomainError::InvalidArgument(_) | DomainError::Unrecognized { .. }) => {
                ErrorKind::InvalidArgument
            },
            Self::Domain(DomainError::NotFound { .. }) => ErrorKind::NotFound,
            Self::Domain(DomainError::PreconditionFailed(_)) => ErrorKind::PreconditionFailed,
            Self::Io(_) => ErrorKind::Io,
            Self::Database(_) => ErrorKind::Database,
            Self::ExternalTool(_) => ErrorKind::ExternalTool,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Configuration(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

//! Database process control port

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for starting, stopping and probing the database server process
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DatabaseProcessPort: Send + Sync {
    /// Whether the server process exists
    async fn is_running(&self) -> Result<bool, ApplicationError>;

    /// Ask the server to shut down gracefully
    async fn shutdown(&self) -> Result<(), ApplicationError>;

    /// Kill the server process
    async fn kill(&self) -> Result<(), ApplicationError>;

    /// Launch the server process in the background
    async fn launch(&self) -> Result<(), ApplicationError>;

    /// Whether the server answers a health check
    async fn ping(&self) -> bool;
}

//! Traffic control port
//!
//! Firewall rules and traffic shaping on the host running the database.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for manipulating reachability and latency of the database
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TrafficControlPort: Send + Sync {
    /// Refuse new connections to `port` with a TCP reset
    async fn set_reject(&self, port: u16) -> Result<(), ApplicationError>;

    /// Silently discard packets to `port`
    async fn set_drop(&self, port: u16) -> Result<(), ApplicationError>;

    /// Remove every firewall rule (idempotent)
    async fn clear_firewall(&self) -> Result<(), ApplicationError>;

    /// Replace the root queueing discipline of `interface` with a delay
    async fn set_latency(&self, latency_ms: u32, interface: &str) -> Result<(), ApplicationError>;

    /// Remove the root queueing discipline of `interface` (idempotent)
    async fn clear_latency(&self, interface: &str) -> Result<(), ApplicationError>;

    /// Interface carrying the default route
    async fn default_interface(&self) -> Result<String, ApplicationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn TrafficControlPort) {}

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn TrafficControlPort>();
    }
}

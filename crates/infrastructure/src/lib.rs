//! Infrastructure layer - Adapters for external systems
//!
//! Implements the application ports against the `mysql` client tools,
//! `iptables`, `tc`/`ip` and the local filesystem. Also owns configuration
//! loading and log subscriber setup.

pub mod adapters;
pub mod config;
pub mod telemetry;

pub use adapters::*;
pub use config::{
    BackupConfig, LoadAppConfig, LoggingConfig, MysqlConfig, NetworkConfig, ToolkitConfig,
};
pub use telemetry::{LoggingError, init_logging};

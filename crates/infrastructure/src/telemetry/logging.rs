use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Filter directive for the given `-v` count
///
/// With no `-v` the configured filter applies; one raises the level to
/// `debug`, two or more to `trace`.
pub fn effective_filter(config: &LoggingConfig, verbosity: u8) -> String {
    match verbosity {
        0 => config.filter.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Install the global subscriber
///
/// `RUST_LOG` overrides the configured filter unless `-v` was given.
/// Output goes to stderr so reports on stdout stay machine-readable.
pub fn init_logging(config: &LoggingConfig, verbosity: u8) -> Result<(), LoggingError> {
    let directive = effective_filter(config, verbosity);
    let env_filter = if verbosity == 0 {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directive))
    } else {
        EnvFilter::new(&directive)
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .try_init()
            .map_err(|e| LoggingError::Init(e.to_string()))?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init()
            .map_err(|e| LoggingError::Init(e.to_string()))?;
    }

    debug!(filter = %directive, json = config.json, "Logging initialized");
    Ok(())
}

/// Error type for logging initialization
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// Failed to install the subscriber
    #[error("Failed to initialize logging: {0}")]
    Init(String),
}

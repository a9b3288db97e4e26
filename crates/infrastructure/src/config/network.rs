//! Network fault timing and targets.

use std::time::Duration;

use application::{DEFAULT_DATABASE_PORT, NetworkFaultConfig};
use serde::{Deserialize, Serialize};

/// Network fault configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Port targeted by firewall faults (default: 3306)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Interface for latency injection; the default-route interface when unset
    #[serde(default)]
    pub interface: Option<String>,

    /// Seconds to wait after a graceful shutdown before force-killing
    #[serde(default = "default_stop_grace_secs")]
    pub stop_grace_secs: u64,

    /// Health checks after launching the server
    #[serde(default = "default_start_attempts")]
    pub start_attempts: u32,

    /// Delay between health checks in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Latency applied when none is given
    #[serde(default = "default_latency_ms")]
    pub default_latency_ms: u32,

    /// Seconds between flap toggles
    #[serde(default = "default_flap_interval_secs")]
    pub flap_interval_secs: u64,

    /// Total length of a flap cycle in seconds
    #[serde(default = "default_flap_duration_secs")]
    pub flap_duration_secs: u64,
}

const fn default_port() -> u16 {
    DEFAULT_DATABASE_PORT
}

const fn default_stop_grace_secs() -> u64 {
    2
}

const fn default_start_attempts() -> u32 {
    30
}

const fn default_poll_interval_ms() -> u64 {
    1000
}

const fn default_latency_ms() -> u32 {
    2000
}

const fn default_flap_interval_secs() -> u64 {
    30
}

const fn default_flap_duration_secs() -> u64 {
    300
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            interface: None,
            stop_grace_secs: default_stop_grace_secs(),
            start_attempts: default_start_attempts(),
            poll_interval_ms: default_poll_interval_ms(),
            default_latency_ms: default_latency_ms(),
            flap_interval_secs: default_flap_interval_secs(),
            flap_duration_secs: default_flap_duration_secs(),
        }
    }
}

impl From<&NetworkConfig> for NetworkFaultConfig {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            port: config.port,
            interface: config.interface.clone(),
            stop_grace: Duration::from_secs(config.stop_grace_secs),
            start_attempts: config.start_attempts,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            default_latency_ms: config.default_latency_ms,
            flap_interval: Duration::from_secs(config.flap_interval_secs),
            flap_duration: Duration::from_secs(config.flap_duration_secs),
        }
    }
}

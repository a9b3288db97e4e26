//! Toolkit configuration
//!
//! Split into focused sub-modules:
//! - `mysql`: server credentials, client binaries, binlog directory
//! - `backup`: backup area
//! - `network`: firewall port, latency and flap timing
//! - `load`: load generation tables and batch size
//! - `logging`: log filter and output format
//!
//! Sources are layered: built-in defaults, then an optional
//! `binlog-chaos.toml`, then `BINLOG_CHAOS_*` environment variables
//! (`BINLOG_CHAOS_NETWORK__PORT=3307`), and finally the conventional
//! `MYSQL_USER`, `MYSQL_ROOT_PASSWORD`, `MYSQL_DATABASE` and `MYSQL_HOST`.

mod backup;
mod load;
mod logging;
mod mysql;
mod network;

use std::collections::HashMap;
use std::path::Path;

use application::{CorruptionConfig, LoadConfig, NetworkFaultConfig};
use serde::{Deserialize, Serialize};

pub use backup::BackupConfig;
pub use load::LoadAppConfig;
pub use logging::LoggingConfig;
pub use mysql::MysqlConfig;
pub use network::NetworkConfig;

/// Base name of the optional configuration file
pub const CONFIG_FILE_NAME: &str = "binlog-chaos";

/// Prefix of toolkit environment variables
pub const ENV_PREFIX: &str = "BINLOG_CHAOS";

/// Conventional MySQL variables and the keys they override
const MYSQL_ENV_OVERRIDES: [(&str, &str); 4] = [
    ("MYSQL_USER", "mysql.user"),
    ("MYSQL_ROOT_PASSWORD", "mysql.password"),
    ("MYSQL_DATABASE", "mysql.database"),
    ("MYSQL_HOST", "mysql.host"),
];

/// Complete toolkit configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolkitConfig {
    /// MySQL server access
    #[serde(default)]
    pub mysql: MysqlConfig,

    /// Backup area
    #[serde(default)]
    pub backup: BackupConfig,

    /// Network faults
    #[serde(default)]
    pub network: NetworkConfig,

    /// Load generation
    #[serde(default)]
    pub load: LoadAppConfig,

    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ToolkitConfig {
    /// Load from `binlog-chaos.toml` in the working directory and the
    /// process environment
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None, std::env::vars().collect())
    }

    /// Load from an explicit file (required when given) and environment map
    pub fn load_from(
        file: Option<&Path>,
        env: HashMap<String, String>,
    ) -> Result<Self, config::ConfigError> {
        let file_source = match file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(CONFIG_FILE_NAME).required(false),
        };
        let overrides: Vec<(&str, Option<String>)> = MYSQL_ENV_OVERRIDES
            .iter()
            .map(|(var, key)| (*key, env.get(*var).cloned()))
            .collect();

        let mut builder = config::Config::builder()
            .add_source(file_source)
            // e.g. BINLOG_CHAOS_MYSQL__BINLOG_DIR
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(env.into_iter().collect())),
            );

        for (key, value) in overrides {
            builder = builder.set_override_option(key, value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Settings for the corruption service
    pub fn corruption(&self) -> CorruptionConfig {
        CorruptionConfig {
            binlog_dir: self.mysql.binlog_dir.clone(),
            backup_dir: self.backup.dir.clone(),
        }
    }

    /// Settings for the network fault controller
    pub fn network_faults(&self) -> NetworkFaultConfig {
        NetworkFaultConfig::from(&self.network)
    }

    /// Settings for the load generator
    pub fn load_generation(&self) -> LoadConfig {
        LoadConfig::from(&self.load)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use secrecy::ExposeSecret;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn defaults_match_toolkit_conventions() {
        let config = ToolkitConfig::default();

        assert_eq!(config.mysql.user, "root");
        assert_eq!(config.mysql.host, "localhost");
        assert_eq!(config.mysql.database, "testdb");
        assert_eq!(config.mysql.binlog_dir, PathBuf::from("/var/lib/mysql"));
        assert_eq!(config.backup.dir, PathBuf::from("/opt/backups"));
        assert_eq!(config.network.port, 3306);
        assert_eq!(config.network.default_latency_ms, 2000);
        assert_eq!(config.load.batch_size, 1000);
        assert_eq!(config.logging.filter, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn load_without_sources_yields_defaults() {
        let config = ToolkitConfig::load_from(None, HashMap::new()).unwrap();

        assert_eq!(config.mysql.user, "root");
        assert_eq!(
            config.mysql.password.as_ref().map(|p| p.expose_secret().to_string()),
            Some("rootpassword".to_string())
        );
        assert_eq!(config.network.flap_duration_secs, 300);
    }

    #[test]
    fn prefixed_env_overrides_nested_keys() {
        let config = ToolkitConfig::load_from(
            None,
            env(&[
                ("BINLOG_CHAOS_NETWORK__PORT", "3307"),
                ("BINLOG_CHAOS_MYSQL__BINLOG_DIR", "/data/binlogs"),
                ("BINLOG_CHAOS_LOGGING__JSON", "true"),
            ]),
        )
        .unwrap();

        assert_eq!(config.network.port, 3307);
        assert_eq!(config.mysql.binlog_dir, PathBuf::from("/data/binlogs"));
        assert!(config.logging.json);
    }

    #[test]
    fn mysql_variables_take_precedence() {
        let config = ToolkitConfig::load_from(
            None,
            env(&[
                ("BINLOG_CHAOS_MYSQL__USER", "toolkit"),
                ("MYSQL_USER", "replicator"),
                ("MYSQL_ROOT_PASSWORD", "s3cret"),
                ("MYSQL_DATABASE", "shop"),
                ("MYSQL_HOST", "db.internal"),
            ]),
        )
        .unwrap();

        assert_eq!(config.mysql.user, "replicator");
        assert_eq!(config.mysql.database, "shop");
        assert_eq!(config.mysql.host, "db.internal");
        assert_eq!(
            config.mysql.password.as_ref().map(|p| p.expose_secret().to_string()),
            Some("s3cret".to_string())
        );
    }

    #[test]
    fn derived_service_configs() {
        let mut config = ToolkitConfig::default();
        config.network.stop_grace_secs = 5;
        config.network.poll_interval_ms = 250;
        config.load.users_table = "customers".to_string();

        let network = config.network_faults();
        assert_eq!(network.stop_grace, Duration::from_secs(5));
        assert_eq!(network.poll_interval, Duration::from_millis(250));
        assert_eq!(network.flap_interval, Duration::from_secs(30));

        assert_eq!(config.load_generation().users_table, "customers");
        assert_eq!(config.corruption().backup_dir, PathBuf::from("/opt/backups"));
    }

    #[test]
    fn debug_redacts_password() {
        let debug = format!("{:?}", ToolkitConfig::default());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("rootpassword"));
    }
}

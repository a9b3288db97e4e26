//! MySQL connection and binary locations.

use std::path::PathBuf;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// How to reach and control the MySQL server
#[derive(Clone, Serialize, Deserialize)]
pub struct MysqlConfig {
    /// Account used by the client tools (default: root)
    #[serde(default = "default_user")]
    pub user: String,

    /// Password for `user` (sensitive - uses `SecretString`)
    #[serde(default = "default_password", skip_serializing)]
    pub password: Option<SecretString>,

    /// Server host (default: localhost)
    #[serde(default = "default_host")]
    pub host: String,

    /// Schema the load and churn operations work in (default: testdb)
    #[serde(default = "default_database")]
    pub database: String,

    /// SQL client binary
    #[serde(default = "default_client_binary")]
    pub client_binary: String,

    /// Administration binary used for shutdown and ping
    #[serde(default = "default_admin_binary")]
    pub admin_binary: String,

    /// Server binary launched on start
    #[serde(default = "default_server_binary")]
    pub server_binary: String,

    /// OS account the server runs as
    #[serde(default = "default_server_user")]
    pub server_user: String,

    /// Directory holding the binlog segments
    #[serde(default = "default_binlog_dir")]
    pub binlog_dir: PathBuf,
}

impl std::fmt::Debug for MysqlConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MysqlConfig")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("host", &self.host)
            .field("database", &self.database)
            .field("client_binary", &self.client_binary)
            .field("admin_binary", &self.admin_binary)
            .field("server_binary", &self.server_binary)
            .field("server_user", &self.server_user)
            .field("binlog_dir", &self.binlog_dir)
            .finish()
    }
}

fn default_user() -> String {
    "root".to_string()
}

#[allow(clippy::unnecessary_wraps)]
fn default_password() -> Option<SecretString> {
    Some(SecretString::from("rootpassword".to_string()))
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_database() -> String {
    "testdb".to_string()
}

fn default_client_binary() -> String {
    "mysql".to_string()
}

fn default_admin_binary() -> String {
    "mysqladmin".to_string()
}

fn default_server_binary() -> String {
    "mysqld".to_string()
}

fn default_server_user() -> String {
    "mysql".to_string()
}

fn default_binlog_dir() -> PathBuf {
    PathBuf::from("/var/lib/mysql")
}

impl Default for MysqlConfig {
    fn default() -> Self {
        Self {
            user: default_user(),
            password: default_password(),
            host: default_host(),
            database: default_database(),
            client_binary: default_client_binary(),
            admin_binary: default_admin_binary(),
            server_binary: default_server_binary(),
            server_user: default_server_user(),
            binlog_dir: default_binlog_dir(),
        }
    }
}

//! Configuration loading from files and environment

#![allow(clippy::expect_used)]

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use infrastructure::ToolkitConfig;
use secrecy::ExposeSecret;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn file_values_override_defaults() {
    let file = write_config(
        r#"
[mysql]
user = "chaos"
binlog_dir = "/srv/mysql"

[backup]
dir = "/srv/backups"

[network]
port = 3307
interface = "ens5"
flap_interval_secs = 10

[load]
batch_size = 250
"#,
    );

    let config =
        ToolkitConfig::load_from(Some(file.path()), HashMap::new()).expect("load config");

    assert_eq!(config.mysql.user, "chaos");
    assert_eq!(config.mysql.host, "localhost");
    assert_eq!(config.mysql.binlog_dir, PathBuf::from("/srv/mysql"));
    assert_eq!(config.backup.dir, PathBuf::from("/srv/backups"));
    assert_eq!(config.network.port, 3307);
    assert_eq!(config.network.interface.as_deref(), Some("ens5"));
    assert_eq!(config.network.flap_duration_secs, 300);
    assert_eq!(config.load.batch_size, 250);
    assert_eq!(config.load.users_table, "users");
}

#[test]
fn environment_beats_file() {
    let file = write_config(
        r#"
[mysql]
password = "from-file"

[network]
port = 3307
"#,
    );
    let env = HashMap::from([
        ("BINLOG_CHAOS_NETWORK__PORT".to_string(), "3308".to_string()),
        ("MYSQL_ROOT_PASSWORD".to_string(), "from-env".to_string()),
    ]);

    let config = ToolkitConfig::load_from(Some(file.path()), env).expect("load config");

    assert_eq!(config.network.port, 3308);
    assert_eq!(
        config.mysql.password.as_ref().map(|p| p.expose_secret().to_string()),
        Some("from-env".to_string())
    );
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let result = ToolkitConfig::load_from(Some(dir.path().join("absent.toml").as_path()), HashMap::new());
    assert!(result.is_err());
}

#[test]
fn invalid_value_is_an_error() {
    let file = write_config("[network]\nport = \"not-a-port\"\n");
    assert!(ToolkitConfig::load_from(Some(file.path()), HashMap::new()).is_err());
}

#[test]
fn service_configs_follow_file() {
    let file = write_config(
        r#"
[mysql]
binlog_dir = "/data/binlog"

[network]
stop_grace_secs = 7
start_attempts = 3
"#,
    );

    let config =
        ToolkitConfig::load_from(Some(file.path()), HashMap::new()).expect("load config");

    assert_eq!(config.corruption().binlog_dir, PathBuf::from("/data/binlog"));
    let network = config.network_faults();
    assert_eq!(network.start_attempts, 3);
    assert_eq!(network.stop_grace.as_secs(), 7);
}

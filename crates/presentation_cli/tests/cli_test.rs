//! Binary smoke tests
//!
//! Only paths that never reach a database or the network stack.

#![allow(clippy::expect_used)]

use std::process::{Command, Output};

fn binlog_chaos(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_binlog-chaos"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("run binlog-chaos")
}

#[test]
fn help_lists_every_command() {
    let output = binlog_chaos(&["--help"]);
    assert!(output.status.success());

    let help = String::from_utf8_lossy(&output.stdout);
    for command in [
        "corrupt",
        "restore",
        "network",
        "transaction",
        "generate",
        "schema",
        "replicate",
        "monitor",
    ] {
        assert!(help.contains(command), "missing {command} in help");
    }
}

#[test]
fn unknown_fault_kind_is_rejected() {
    let output = binlog_chaos(&["network", "down", "earthquake"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("earthquake"));
}

#[test]
fn restore_list_on_empty_backup_dir() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let output = Command::new(env!("CARGO_BIN_EXE_binlog-chaos"))
        .args(["restore", "--list", "--json"])
        .env("BINLOG_CHAOS_BACKUP__DIR", dir.path())
        .output()
        .expect("run binlog-chaos");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "[]");
}

#[test]
fn missing_config_file_fails() {
    let output = binlog_chaos(&["--config", "/nonexistent/binlog-chaos.toml", "monitor", "--once"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("configuration"));
}

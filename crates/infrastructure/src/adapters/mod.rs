//! Adapters implementing application ports
//!
//! Each adapter drives a real tool or the local filesystem.

mod command;
mod fs_binlog_store;
mod linux_traffic_adapter;
mod mysql_cli_adapter;
mod mysqld_process_adapter;

pub use fs_binlog_store::FsBinlogStore;
pub use linux_traffic_adapter::{
    FALLBACK_INTERFACE, LinuxTrafficControl, drop_rule_args, netem_args, parse_default_interface,
    qdisc_del_args, reject_rule_args,
};
pub use mysql_cli_adapter::{
    MysqlCliAdapter, MysqlSession, client_args, parse_binary_logs, parse_master_status,
};
pub use mysqld_process_adapter::MysqldProcessAdapter;

//! Firewall and traffic shaping with `iptables`, `tc` and `ip`

use application::{ApplicationError, TrafficControlPort};
use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use super::command::run_tool;

/// Interface used when the default route cannot be determined
pub const FALLBACK_INTERFACE: &str = "eth0";

fn to_strings<const N: usize>(args: [&str; N]) -> Vec<String> {
    args.into_iter().map(String::from).collect()
}

/// `iptables` arguments answering new connections to `port` with a reset
pub fn reject_rule_args(port: u16) -> Vec<String> {
    let port = port.to_string();
    to_strings([
        "-A",
        "INPUT",
        "-p",
        "tcp",
        "--dport",
        &port,
        "-j",
        "REJECT",
        "--reject-with",
        "tcp-reset",
    ])
}

/// `iptables` arguments silently discarding packets to `port`
pub fn drop_rule_args(port: u16) -> Vec<String> {
    let port = port.to_string();
    to_strings(["-A", "INPUT", "-p", "tcp", "--dport", &port, "-j", "DROP"])
}

/// `tc` arguments installing a netem delay as the root qdisc
pub fn netem_args(latency_ms: u32, interface: &str) -> Vec<String> {
    let delay = format!("{latency_ms}ms");
    to_strings([
        "qdisc", "add", "dev", interface, "root", "netem", "delay", &delay,
    ])
}

/// `tc` arguments removing the root qdisc
pub fn qdisc_del_args(interface: &str) -> Vec<String> {
    to_strings(["qdisc", "del", "dev", interface, "root"])
}

/// Interface named after `dev` in `ip route show default` output
pub fn parse_default_interface(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let mut tokens = line.split_whitespace();
        tokens.find(|t| *t == "dev")?;
        tokens.next().map(String::from)
    })
}

/// `TrafficControlPort` for the local Linux host
#[derive(Debug, Clone)]
pub struct LinuxTrafficControl {
    iptables: String,
    tc: String,
    ip: String,
}

impl Default for LinuxTrafficControl {
    fn default() -> Self {
        Self::new()
    }
}

impl LinuxTrafficControl {
    /// Use `iptables`, `tc` and `ip` from `PATH`
    pub fn new() -> Self {
        Self {
            iptables: "iptables".to_string(),
            tc: "tc".to_string(),
            ip: "ip".to_string(),
        }
    }

    async fn iptables(&self, args: Vec<String>) -> Result<(), ApplicationError> {
        run_tool(&self.iptables, &args)
            .await?
            .into_stdout(&self.iptables)
            .map(|_| ())
    }
}

#[async_trait]
impl TrafficControlPort for LinuxTrafficControl {
    #[instrument(skip(self))]
    async fn set_reject(&self, port: u16) -> Result<(), ApplicationError> {
        self.iptables(reject_rule_args(port)).await?;
        info!("Reject rule installed");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_drop(&self, port: u16) -> Result<(), ApplicationError> {
        self.iptables(drop_rule_args(port)).await?;
        info!("Drop rule installed");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_firewall(&self) -> Result<(), ApplicationError> {
        self.iptables(to_strings(["-F"])).await?;
        self.iptables(to_strings(["-X"])).await?;
        debug!("Firewall rules flushed");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_latency(&self, latency_ms: u32, interface: &str) -> Result<(), ApplicationError> {
        // Replace whatever root qdisc is installed
        self.clear_latency(interface).await?;
        run_tool(&self.tc, netem_args(latency_ms, interface))
            .await?
            .into_stdout(&self.tc)?;
        info!("Latency installed");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_latency(&self, interface: &str) -> Result<(), ApplicationError> {
        let output = run_tool(&self.tc, qdisc_del_args(interface)).await?;
        // Deleting a missing qdisc fails; that is the cleared state
        if !output.success() {
            debug!(stderr = %output.stderr.trim(), "No root qdisc to remove");
        }
        Ok(())
    }

    async fn default_interface(&self) -> Result<String, ApplicationError> {
        let output = run_tool(&self.ip, ["route", "show", "default"]).await;
        let interface = match output {
            Ok(output) if output.success() => parse_default_interface(&output.stdout),
            Ok(output) => {
                warn!(error = %output.describe_failure(&self.ip), "Default route lookup failed");
                None
            },
            Err(e) => {
                warn!(error = %e, "Default route lookup failed");
                None
            },
        };

        Ok(interface.unwrap_or_else(|| FALLBACK_INTERFACE.to_string()))
    }
}

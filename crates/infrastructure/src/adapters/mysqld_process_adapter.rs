//! Server process control through `pgrep`, `pkill`, `mysqladmin` and `mysqld`

use std::path::Path;
use std::process::Stdio;

use application::{ApplicationError, DatabaseProcessPort};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use super::command::{own_process_group, run_tool};
use super::mysql_cli_adapter::{connection_args, with_password};
use crate::config::MysqlConfig;

/// `DatabaseProcessPort` for a locally running `mysqld`
#[derive(Debug, Clone)]
pub struct MysqldProcessAdapter {
    config: MysqlConfig,
}

impl MysqldProcessAdapter {
    /// Create an adapter controlling the configured server binary
    pub fn new(config: MysqlConfig) -> Self {
        Self { config }
    }

    /// Process name matched by `pgrep`/`pkill`
    pub fn process_name(&self) -> String {
        Path::new(&self.config.server_binary)
            .file_name()
            .map_or_else(
                || self.config.server_binary.clone(),
                |name| name.to_string_lossy().into_owned(),
            )
    }

    /// Arguments for `mysqladmin <action>`
    pub fn admin_args(&self, action: &str) -> Vec<String> {
        let mut args = connection_args(&self.config);
        args.push(action.to_string());
        args
    }

    fn admin_command(&self, action: &str) -> Command {
        let mut cmd = Command::new(&self.config.admin_binary);
        cmd.args(self.admin_args(action))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        with_password(&mut cmd, &self.config);
        cmd
    }

    fn server_command(&self) -> Command {
        let mut cmd = Command::new(&self.config.server_binary);
        cmd.arg(format!("--user={}", self.config.server_user))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }
}

#[async_trait]
impl DatabaseProcessPort for MysqldProcessAdapter {
    async fn is_running(&self) -> Result<bool, ApplicationError> {
        let output = run_tool("pgrep", ["-x", self.process_name().as_str()]).await?;
        // pgrep exits 1 when nothing matched
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(ApplicationError::ExternalTool(
                output.describe_failure("pgrep"),
            )),
        }
    }

    #[instrument(skip(self))]
    async fn shutdown(&self) -> Result<(), ApplicationError> {
        let output = self.admin_command("shutdown").output().await.map_err(|e| {
            ApplicationError::ExternalTool(format!(
                "failed to run {}: {e}",
                self.config.admin_binary
            ))
        })?;

        if output.status.success() {
            info!("Graceful shutdown requested");
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(ApplicationError::ExternalTool(format!(
                "{} shutdown failed: {}",
                self.config.admin_binary,
                stderr.trim()
            )))
        }
    }

    #[instrument(skip(self))]
    async fn kill(&self) -> Result<(), ApplicationError> {
        let output = run_tool("pkill", ["-9", "-x", self.process_name().as_str()]).await?;
        match output.status.code() {
            Some(0) => {
                warn!("Server process killed");
                Ok(())
            },
            Some(1) => {
                debug!("No server process to kill");
                Ok(())
            },
            _ => Err(ApplicationError::ExternalTool(
                output.describe_failure("pkill"),
            )),
        }
    }

    #[instrument(skip(self))]
    async fn launch(&self) -> Result<(), ApplicationError> {
        let mut cmd = self.server_command();
        let child = own_process_group(&mut cmd)
            .spawn()
            .map_err(|e| {
                ApplicationError::ExternalTool(format!(
                    "failed to launch {}: {e}",
                    self.config.server_binary
                ))
            })?;

        // The server keeps running after the handle is dropped
        info!(pid = child.id(), "Server launched");
        Ok(())
    }

    async fn ping(&self) -> bool {
        let mut cmd = self.admin_command("ping");
        cmd.arg("--silent");
        matches!(cmd.output().await, Ok(output) if output.status.success())
    }
}

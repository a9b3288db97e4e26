//! Running external command-line tools

use std::ffi::OsStr;
use std::fmt::Write as _;
use std::process::{ExitStatus, Stdio};

use application::ApplicationError;
use tokio::process::Command;
use tracing::debug;

/// Captured result of a finished tool invocation
#[derive(Debug)]
pub(crate) struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Stdout on success, `ExternalTool` with stderr otherwise
    pub fn into_stdout(self, program: &str) -> Result<String, ApplicationError> {
        if self.success() {
            Ok(self.stdout)
        } else {
            Err(ApplicationError::ExternalTool(self.describe_failure(program)))
        }
    }

    pub fn describe_failure(&self, program: &str) -> String {
        let mut message = format!("{program} exited with {}", self.status);
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            let _ = write!(message, ": {stderr}");
        }
        message
    }
}

/// Start the child in a process group of its own
///
/// A terminal Ctrl+C signals the whole foreground group. Clients holding an
/// open transaction and servers launched by us must not see it.
pub(crate) fn own_process_group(cmd: &mut Command) -> &mut Command {
    #[cfg(unix)]
    cmd.process_group(0);
    cmd
}

/// Run `program` to completion, capturing its output
///
/// Failing to start the program is an `ExternalTool` error; a nonzero exit
/// is left for the caller to judge.
pub(crate) async fn run_tool<I, S>(program: &str, args: I) -> Result<ToolOutput, ApplicationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    debug!(command = ?cmd.as_std(), "Running tool");

    let output = cmd
        .output()
        .await
        .map_err(|e| ApplicationError::ExternalTool(format!("failed to run {program}: {e}")))?;

    Ok(ToolOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

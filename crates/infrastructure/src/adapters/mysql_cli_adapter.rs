//! SQL execution through the `mysql` command-line client
//!
//! One-shot statements run in a fresh client process. Transactions keep a
//! single client process alive for their whole lifetime and feed it
//! statements over stdin; each statement is followed by a `SELECT` of a
//! unique marker so the adapter knows where its output ends. The client
//! runs in batch mode, so the first failing statement makes it exit and
//! the server discards the open transaction.

use std::process::Stdio;

use application::{ApplicationError, DatabasePort, TransactionPort};
use async_trait::async_trait;
use domain::{BinlogFile, BinlogStatus};
use secrecy::ExposeSecret;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, instrument, warn};

use super::command::own_process_group;
use crate::config::MysqlConfig;

/// Environment variable the MySQL tools read the password from
pub(crate) const PASSWORD_ENV: &str = "MYSQL_PWD";

/// `--user`/`--host` arguments shared by the MySQL tools
pub(crate) fn connection_args(config: &MysqlConfig) -> Vec<String> {
    vec![
        format!("--user={}", config.user),
        format!("--host={}", config.host),
    ]
}

/// Full argument list for a batch-mode client session
pub fn client_args(config: &MysqlConfig) -> Vec<String> {
    let mut args = connection_args(config);
    args.extend(
        ["--batch", "--skip-column-names", "--unbuffered"]
            .into_iter()
            .map(String::from),
    );
    args.push(config.database.clone());
    args
}

/// Attach the password, if any, without exposing it in the process list
pub(crate) fn with_password(cmd: &mut Command, config: &MysqlConfig) {
    if let Some(password) = &config.password {
        cmd.env(PASSWORD_ENV, password.expose_secret());
    }
}

/// Parse `SHOW MASTER STATUS` output
///
/// Columns are file, position, do-db, ignore-db and executed GTID set.
/// No rows means binary logging is disabled.
pub fn parse_master_status(output: &str) -> Result<Option<BinlogStatus>, ApplicationError> {
    let Some(line) = output.lines().find(|l| !l.trim().is_empty()) else {
        return Ok(None);
    };

    let columns: Vec<&str> = line.split('\t').collect();
    let file = columns
        .first()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ApplicationError::Database(format!("unexpected master status: {line}")))?;
    let position = columns
        .get(1)
        .and_then(|p| p.trim().parse::<u64>().ok())
        .ok_or_else(|| ApplicationError::Database(format!("unexpected master status: {line}")))?;
    let gtid = columns.get(4).map_or("", |g| g.trim());

    Ok(Some(BinlogStatus {
        file: file.to_string(),
        position,
        gtid: gtid.to_string(),
    }))
}

/// Parse `SHOW BINARY LOGS` output (name, size, encrypted)
pub fn parse_binary_logs(output: &str) -> Result<Vec<BinlogFile>, ApplicationError> {
    output
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|line| {
            let columns: Vec<&str> = line.split('\t').collect();
            match (columns.first(), columns.get(1)) {
                (Some(name), Some(size)) => {
                    let size = size.trim().parse::<u64>().map_err(|_| {
                        ApplicationError::Database(format!("unexpected binary log row: {line}"))
                    })?;
                    let encrypted = columns
                        .get(2)
                        .is_some_and(|e| e.trim().eq_ignore_ascii_case("yes"));
                    Ok(BinlogFile::new(name.trim(), size, encrypted))
                },
                _ => Err(ApplicationError::Database(format!(
                    "unexpected binary log row: {line}"
                ))),
            }
        })
        .collect()
}

/// Terminate a statement with `;` if it is not already
fn terminated(sql: &str) -> String {
    let sql = sql.trim_end();
    if sql.ends_with(';') {
        sql.to_string()
    } else {
        format!("{sql};")
    }
}

fn stderr_message(stderr: &[u8], fallback: impl FnOnce() -> String) -> String {
    let stderr = String::from_utf8_lossy(stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        fallback()
    } else {
        stderr.to_string()
    }
}

/// `DatabasePort` backed by the `mysql` client binary
#[derive(Debug, Clone)]
pub struct MysqlCliAdapter {
    config: MysqlConfig,
    program: String,
    args: Vec<String>,
}

impl MysqlCliAdapter {
    /// Create an adapter for the given server
    pub fn new(config: MysqlConfig) -> Self {
        let program = config.client_binary.clone();
        let args = client_args(&config);
        Self {
            config,
            program,
            args,
        }
    }

    fn client_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        own_process_group(&mut cmd);
        with_password(&mut cmd, &self.config);
        cmd
    }

    fn spawn(&self) -> Result<Child, ApplicationError> {
        self.client_command().spawn().map_err(|e| {
            ApplicationError::Database(format!("failed to start {}: {e}", self.program))
        })
    }
}

#[async_trait]
impl DatabasePort for MysqlCliAdapter {
    #[instrument(skip(self))]
    async fn execute(&self, sql: &str) -> Result<String, ApplicationError> {
        let mut child = self.spawn()?;

        // A write error usually means the client already exited; its stderr
        // explains why better than the broken pipe does.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(terminated(sql).as_bytes()).await,
            None => Ok(()),
        };

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ApplicationError::Database(format!("mysql client failed: {e}")))?;

        if !output.status.success() {
            let message = stderr_message(&output.stderr, || {
                format!("mysql exited with {}", output.status)
            });
            warn!(error = %message, "Statement failed");
            return Err(ApplicationError::Database(message));
        }
        written.map_err(|e| ApplicationError::Database(format!("failed to send SQL: {e}")))?;

        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }

    #[instrument(skip(self))]
    async fn begin(&self) -> Result<Box<dyn TransactionPort>, ApplicationError> {
        let mut child = self.spawn()?;
        let stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or_else(|| ApplicationError::Internal("mysql stdout not captured".to_string()))?;

        let mut session = MysqlSession {
            child,
            stdin,
            stdout,
            statements: 0,
        };
        session.execute("START TRANSACTION").await?;
        debug!("Transaction session opened");

        Ok(Box::new(session))
    }

    async fn binlog_status(&self) -> Result<Option<BinlogStatus>, ApplicationError> {
        let output = self.execute("SHOW MASTER STATUS").await?;
        parse_master_status(&output)
    }

    async fn binlog_files(&self) -> Result<Vec<BinlogFile>, ApplicationError> {
        let output = self.execute("SHOW BINARY LOGS").await?;
        parse_binary_logs(&output)
    }

    async fn flush_binary_logs(&self) -> Result<(), ApplicationError> {
        self.execute("FLUSH BINARY LOGS").await.map(|_| ())
    }

    async fn record_count(&self, table: &str) -> Result<u64, ApplicationError> {
        let output = self.execute(&format!("SELECT COUNT(*) FROM {table}")).await?;
        let count = output.trim();
        if count.is_empty() {
            return Ok(0);
        }
        count
            .parse()
            .map_err(|_| ApplicationError::Database(format!("unexpected count output: {count}")))
    }
}

/// One `mysql` client process holding an open transaction
///
/// Dropping the session kills the client, which makes the server roll the
/// transaction back.
#[derive(Debug)]
pub struct MysqlSession {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    statements: u64,
}

impl MysqlSession {
    /// Tear the session down and describe why it ended
    async fn closed(&mut self, context: &str) -> ApplicationError {
        self.stdin = None;
        let _ = self.child.start_kill();
        let _ = self.child.wait().await;

        let mut stderr = Vec::new();
        if let Some(mut pipe) = self.child.stderr.take() {
            let _ = pipe.read_to_end(&mut stderr).await;
        }

        let message = stderr_message(&stderr, || format!("mysql session {context}"));
        warn!(error = %message, "Transaction session lost");
        ApplicationError::Database(message)
    }

    async fn finish(&mut self, statement: &str) -> Result<(), ApplicationError> {
        self.execute(statement).await?;
        // EOF on stdin ends the client
        self.stdin = None;

        let status = self
            .child
            .wait()
            .await
            .map_err(|e| ApplicationError::Database(format!("mysql client failed: {e}")))?;
        if status.success() {
            Ok(())
        } else {
            Err(ApplicationError::Database(format!(
                "mysql exited with {status} after {statement}"
            )))
        }
    }
}

#[async_trait]
impl TransactionPort for MysqlSession {
    async fn execute(&mut self, sql: &str) -> Result<String, ApplicationError> {
        self.statements += 1;
        let marker = format!("__binlog_chaos_{}__", self.statements);
        let script = format!("{}\nSELECT '{marker}';\n", terminated(sql));

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ApplicationError::Database(
                "mysql session already closed".to_string(),
            ));
        };
        let sent = match stdin.write_all(script.as_bytes()).await {
            Ok(()) => stdin.flush().await,
            Err(e) => Err(e),
        };
        if sent.is_err() {
            return Err(self.closed("stopped accepting statements").await);
        }

        let mut rows = Vec::new();
        loop {
            let mut line = String::new();
            match self.stdout.read_line(&mut line).await {
                Ok(0) | Err(_) => return Err(self.closed("ended unexpectedly").await),
                Ok(_) => {
                    let line = line.trim_end_matches(['\n', '\r']);
                    if line == marker {
                        break;
                    }
                    rows.push(line.to_string());
                },
            }
        }

        Ok(rows.join("\n"))
    }

    async fn commit(&mut self) -> Result<(), ApplicationError> {
        self.finish("COMMIT").await
    }

    async fn rollback(&mut self) -> Result<(), ApplicationError> {
        self.finish("ROLLBACK").await
    }
}

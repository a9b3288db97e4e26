//! In-memory fakes of the ports for service tests

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use domain::{BinlogFile, BinlogStatus, DomainError};
use parking_lot::Mutex;

use crate::error::ApplicationError;
use crate::ports::{
    BinlogStorePort, DatabasePort, DatabaseProcessPort, StoredFile, TrafficControlPort,
    TransactionPort,
};

// ============================================================================
// Filesystem
// ============================================================================

/// Files held in memory, keyed by full path
#[derive(Debug, Default)]
pub struct InMemoryBinlogStore {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
}

impl InMemoryBinlogStore {
    pub fn with_file(self, path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        self.files.lock().insert(path.into(), bytes);
        self
    }

    pub fn contents(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.lock().get(path).cloned()
    }

    fn not_found(path: &Path) -> ApplicationError {
        DomainError::not_found("File", path.display().to_string()).into()
    }
}

#[async_trait]
impl BinlogStorePort for InMemoryBinlogStore {
    async fn exists(&self, path: &Path) -> bool {
        self.files.lock().contains_key(path)
    }

    async fn size(&self, path: &Path) -> Result<u64, ApplicationError> {
        self.files
            .lock()
            .get(path)
            .map(|bytes| bytes.len() as u64)
            .ok_or_else(|| Self::not_found(path))
    }

    async fn read_at(
        &self,
        path: &Path,
        offset: u64,
        len: usize,
    ) -> Result<Vec<u8>, ApplicationError> {
        let files = self.files.lock();
        let bytes = files.get(path).ok_or_else(|| Self::not_found(path))?;
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(bytes.len());
        let end = start.saturating_add(len).min(bytes.len());
        Ok(bytes[start..end].to_vec())
    }

    async fn write_at(
        &self,
        path: &Path,
        offset: u64,
        data: &[u8],
    ) -> Result<(), ApplicationError> {
        let mut files = self.files.lock();
        let bytes = files.get_mut(path).ok_or_else(|| Self::not_found(path))?;
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        if bytes.len() < start + data.len() {
            bytes.resize(start + data.len(), 0);
        }
        bytes[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    async fn truncate(&self, path: &Path, len: u64) -> Result<(), ApplicationError> {
        let mut files = self.files.lock();
        let bytes = files.get_mut(path).ok_or_else(|| Self::not_found(path))?;
        bytes.resize(usize::try_from(len).unwrap_or(usize::MAX), 0);
        Ok(())
    }

    async fn copy(&self, from: &Path, to: &Path) -> Result<u64, ApplicationError> {
        let mut files = self.files.lock();
        let bytes = files.get(from).cloned().ok_or_else(|| Self::not_found(from))?;
        let len = bytes.len() as u64;
        files.insert(to.to_path_buf(), bytes);
        Ok(len)
    }

    async fn list(&self, dir: &Path, suffix: &str) -> Result<Vec<StoredFile>, ApplicationError> {
        let files = self.files.lock();
        let mut found: Vec<StoredFile> = files
            .iter()
            .filter(|(path, _)| {
                path.parent() == Some(dir)
                    && path
                        .file_name()
                        .is_some_and(|name| name.to_string_lossy().ends_with(suffix))
            })
            .map(|(path, bytes)| StoredFile {
                path: path.clone(),
                size_bytes: bytes.len() as u64,
            })
            .collect();
        found.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(found)
    }
}

// ============================================================================
// Database
// ============================================================================

#[derive(Debug, Default)]
struct FakeDatabaseState {
    committed: Vec<String>,
    rolled_back: usize,
    fail_on: Option<(String, usize)>,
    seen_failing: usize,
    responses: Vec<(String, String)>,
    binlog: Option<BinlogStatus>,
    binlog_files: Vec<BinlogFile>,
    flushes: usize,
}

impl FakeDatabaseState {
    fn run(&mut self, sql: &str) -> Result<String, ApplicationError> {
        if let Some((needle, nth)) = &self.fail_on {
            if sql.contains(needle.as_str()) {
                self.seen_failing += 1;
                if self.seen_failing == *nth {
                    return Err(ApplicationError::Database(format!(
                        "forced failure on statement {nth}"
                    )));
                }
            }
        }
        Ok(self
            .responses
            .iter()
            .find(|(prefix, _)| sql.starts_with(prefix.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_default())
    }
}

/// Transactional database double
///
/// Auto-committed statements and committed transactions land in the same
/// log; rolled-back work is discarded.
#[derive(Debug, Clone, Default)]
pub struct FakeDatabase {
    state: Arc<Mutex<FakeDatabaseState>>,
}

impl FakeDatabase {
    /// Fail the `nth` statement (1-based) containing `needle`
    pub fn failing_on(self, needle: &str, nth: usize) -> Self {
        self.state.lock().fail_on = Some((needle.to_string(), nth));
        self
    }

    /// Answer statements starting with `prefix` with `output`
    pub fn responding(self, prefix: &str, output: &str) -> Self {
        self.state
            .lock()
            .responses
            .push((prefix.to_string(), output.to_string()));
        self
    }

    pub fn with_binlog(self, file: &str, position: u64, gtid: &str) -> Self {
        self.state.lock().binlog = Some(BinlogStatus {
            file: file.to_string(),
            position,
            gtid: gtid.to_string(),
        });
        self
    }

    pub fn with_binlog_files(self, files: Vec<BinlogFile>) -> Self {
        self.state.lock().binlog_files = files;
        self
    }

    pub fn committed(&self) -> Vec<String> {
        self.state.lock().committed.clone()
    }

    pub fn committed_matching(&self, needle: &str) -> usize {
        self.state
            .lock()
            .committed
            .iter()
            .filter(|sql| sql.contains(needle))
            .count()
    }

    /// Rows committed by INSERT statements, counting `('` tuple openers
    pub fn committed_insert_rows(&self) -> usize {
        self.state
            .lock()
            .committed
            .iter()
            .filter(|sql| sql.starts_with("INSERT"))
            .map(|sql| sql.matches("('").count())
            .sum()
    }

    pub fn rollbacks(&self) -> usize {
        self.state.lock().rolled_back
    }

    pub fn flushes(&self) -> usize {
        self.state.lock().flushes
    }
}

#[async_trait]
impl DatabasePort for FakeDatabase {
    async fn execute(&self, sql: &str) -> Result<String, ApplicationError> {
        let mut state = self.state.lock();
        let output = state.run(sql)?;
        state.committed.push(sql.to_string());
        Ok(output)
    }

    async fn begin(&self) -> Result<Box<dyn TransactionPort>, ApplicationError> {
        Ok(Box::new(FakeTransaction {
            state: Arc::clone(&self.state),
            pending: Vec::new(),
        }))
    }

    async fn binlog_status(&self) -> Result<Option<BinlogStatus>, ApplicationError> {
        Ok(self.state.lock().binlog.clone())
    }

    async fn binlog_files(&self) -> Result<Vec<BinlogFile>, ApplicationError> {
        Ok(self.state.lock().binlog_files.clone())
    }

    async fn flush_binary_logs(&self) -> Result<(), ApplicationError> {
        let mut state = self.state.lock();
        state.flushes += 1;
        let mut advanced = None;
        if let Some(status) = &state.binlog {
            let sequence: u64 = status
                .file
                .rsplit('.')
                .next()
                .and_then(|n| n.parse().ok())
                .unwrap_or(0);
            let stem = status.file.rsplit_once('.').map_or("mysql-bin", |(s, _)| s);
            advanced = Some(BinlogStatus {
                file: format!("{stem}.{:06}", sequence + 1),
                position: 157,
                gtid: status.gtid.clone(),
            });
        }
        if advanced.is_some() {
            state.binlog = advanced;
        }
        Ok(())
    }

    async fn record_count(&self, table: &str) -> Result<u64, ApplicationError> {
        let rows = self
            .state
            .lock()
            .committed
            .iter()
            .filter(|sql| sql.starts_with(&format!("INSERT INTO {table} ")))
            .map(|sql| sql.matches("('").count() as u64)
            .sum();
        Ok(rows)
    }
}

struct FakeTransaction {
    state: Arc<Mutex<FakeDatabaseState>>,
    pending: Vec<String>,
}

#[async_trait]
impl TransactionPort for FakeTransaction {
    async fn execute(&mut self, sql: &str) -> Result<String, ApplicationError> {
        let output = self.state.lock().run(sql)?;
        self.pending.push(sql.to_string());
        Ok(output)
    }

    async fn commit(&mut self) -> Result<(), ApplicationError> {
        self.state.lock().committed.append(&mut self.pending);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), ApplicationError> {
        self.pending.clear();
        self.state.lock().rolled_back += 1;
        Ok(())
    }
}

// ============================================================================
// Process and traffic control
// ============================================================================

#[derive(Debug)]
struct FakeProcessState {
    running: bool,
    graceful_shutdown: bool,
    answers_ping: bool,
    calls: Vec<&'static str>,
}

/// Database process double
#[derive(Debug, Clone)]
pub struct FakeProcess {
    state: Arc<Mutex<FakeProcessState>>,
}

impl FakeProcess {
    pub fn running() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeProcessState {
                running: true,
                graceful_shutdown: true,
                answers_ping: true,
                calls: Vec::new(),
            })),
        }
    }

    pub fn stopped() -> Self {
        let process = Self::running();
        process.state.lock().running = false;
        process
    }

    /// Ignore graceful shutdown requests
    pub fn ignoring_shutdown(self) -> Self {
        self.state.lock().graceful_shutdown = false;
        self
    }

    /// Never answer health checks
    pub fn never_ready(self) -> Self {
        self.state.lock().answers_ping = false;
        self
    }

    pub fn is_up(&self) -> bool {
        self.state.lock().running
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().calls.clone()
    }
}

#[async_trait]
impl DatabaseProcessPort for FakeProcess {
    async fn is_running(&self) -> Result<bool, ApplicationError> {
        Ok(self.state.lock().running)
    }

    async fn shutdown(&self) -> Result<(), ApplicationError> {
        let mut state = self.state.lock();
        state.calls.push("shutdown");
        if state.graceful_shutdown {
            state.running = false;
        }
        Ok(())
    }

    async fn kill(&self) -> Result<(), ApplicationError> {
        let mut state = self.state.lock();
        state.calls.push("kill");
        state.running = false;
        Ok(())
    }

    async fn launch(&self) -> Result<(), ApplicationError> {
        let mut state = self.state.lock();
        state.calls.push("launch");
        state.running = true;
        Ok(())
    }

    async fn ping(&self) -> bool {
        let state = self.state.lock();
        state.running && state.answers_ping
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Reject(u16),
    Drop(u16),
}

#[derive(Debug, Default)]
struct FakeTrafficState {
    rules: Vec<Rule>,
    latency: Option<(u32, String)>,
    fail_set_drop: bool,
}

/// Firewall and traffic shaping double
#[derive(Debug, Clone, Default)]
pub struct FakeTraffic {
    state: Arc<Mutex<FakeTrafficState>>,
}

impl FakeTraffic {
    pub fn failing_drop(self) -> Self {
        self.state.lock().fail_set_drop = true;
        self
    }

    pub fn rules(&self) -> Vec<Rule> {
        self.state.lock().rules.clone()
    }

    pub fn latency(&self) -> Option<(u32, String)> {
        self.state.lock().latency.clone()
    }

    pub fn is_open(&self) -> bool {
        let state = self.state.lock();
        state.rules.is_empty() && state.latency.is_none()
    }
}

#[async_trait]
impl TrafficControlPort for FakeTraffic {
    async fn set_reject(&self, port: u16) -> Result<(), ApplicationError> {
        self.state.lock().rules.push(Rule::Reject(port));
        Ok(())
    }

    async fn set_drop(&self, port: u16) -> Result<(), ApplicationError> {
        let mut state = self.state.lock();
        if state.fail_set_drop {
            return Err(ApplicationError::ExternalTool(
                "iptables: permission denied".to_string(),
            ));
        }
        state.rules.push(Rule::Drop(port));
        Ok(())
    }

    async fn clear_firewall(&self) -> Result<(), ApplicationError> {
        self.state.lock().rules.clear();
        Ok(())
    }

    async fn set_latency(&self, latency_ms: u32, interface: &str) -> Result<(), ApplicationError> {
        self.state.lock().latency = Some((latency_ms, interface.to_string()));
        Ok(())
    }

    async fn clear_latency(&self, _interface: &str) -> Result<(), ApplicationError> {
        self.state.lock().latency = None;
        Ok(())
    }

    async fn default_interface(&self) -> Result<String, ApplicationError> {
        Ok("eth0".to_string())
    }
}

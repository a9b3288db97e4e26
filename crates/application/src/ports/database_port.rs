//! Database control port
//!
//! Defines how the engine runs SQL and reads replication state. How the SQL
//! reaches the server (client binary, driver, proxy) is up to the adapter.

use async_trait::async_trait;
use domain::{BinlogFile, BinlogStatus};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for SQL execution and binlog inspection
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DatabasePort: Send + Sync {
    /// Execute a statement outside any explicit transaction
    ///
    /// Returns the result rows as tab-separated lines without a header.
    /// A nonzero exit or server error is reported as
    /// `ApplicationError::Database`.
    async fn execute(&self, sql: &str) -> Result<String, ApplicationError>;

    /// Open a session with a started transaction
    async fn begin(&self) -> Result<Box<dyn TransactionPort>, ApplicationError>;

    /// Current binlog file, position and executed GTID set
    ///
    /// Returns `None` when binary logging is disabled.
    async fn binlog_status(&self) -> Result<Option<BinlogStatus>, ApplicationError>;

    /// All binlog segments known to the server
    async fn binlog_files(&self) -> Result<Vec<BinlogFile>, ApplicationError>;

    /// Close the current binlog segment and start a new one
    async fn flush_binary_logs(&self) -> Result<(), ApplicationError>;

    /// Number of rows in `table`
    async fn record_count(&self, table: &str) -> Result<u64, ApplicationError>;
}

/// A session holding one open transaction
///
/// Statements are applied in submission order. Dropping a session without
/// committing discards its work.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TransactionPort: Send {
    /// Execute a statement inside the transaction
    async fn execute(&mut self, sql: &str) -> Result<String, ApplicationError>;

    /// Commit and close the session
    async fn commit(&mut self) -> Result<(), ApplicationError>;

    /// Roll back and close the session
    async fn rollback(&mut self) -> Result<(), ApplicationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn DatabasePort, _: &dyn TransactionPort) {}

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        fn assert_send<T: Send + ?Sized>() {}
        assert_send_sync::<dyn DatabasePort>();
        assert_send::<dyn TransactionPort>();
    }

    #[tokio::test]
    async fn mock_begin_hands_out_transaction() {
        let mut mock = MockDatabasePort::new();
        mock.expect_begin().times(1).returning(|| {
            let mut tx = MockTransactionPort::new();
            tx.expect_execute().returning(|_| Ok(String::new()));
            tx.expect_commit().times(1).returning(|| Ok(()));
            Ok(Box::new(tx))
        });

        let mut tx = mock.begin().await.unwrap();
        tx.execute("UPDATE t SET v = 1;").await.unwrap();
        tx.commit().await.unwrap();
    }
}

//! Schema churn: DDL that schema-aware consumers must follow

use std::sync::Arc;

use domain::{
    COLUMN_TYPES, DomainError, ESSENTIAL_COLUMNS, PROTECTED_TABLES, SchemaChange,
    SchemaChangeOutcome,
};
use parking_lot::Mutex;
use tracing::{info, instrument, warn};

use super::record_synthesizer::RecordSynthesizer;
use crate::error::ApplicationError;
use crate::ports::DatabasePort;

/// Prefix of columns added by churn, the only ones it drops
pub const CHURN_COLUMN_PREFIX: &str = "col_";

/// Prefix of tables created by churn, the only ones it drops
pub const CHURN_TABLE_PREFIX: &str = "test_";

/// Rows inserted into each created table
const SEED_ROWS: u32 = 3;

/// Applies random DDL changes
pub struct SchemaChurnService {
    database: Arc<dyn DatabasePort>,
    synthesizer: Mutex<RecordSynthesizer>,
}

impl std::fmt::Debug for SchemaChurnService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaChurnService").finish_non_exhaustive()
    }
}

impl SchemaChurnService {
    pub fn new(database: Arc<dyn DatabasePort>) -> Self {
        Self {
            database,
            synthesizer: Mutex::new(RecordSynthesizer::from_entropy()),
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.synthesizer = Mutex::new(RecordSynthesizer::seeded(seed));
        self
    }

    /// Add a randomly named column of a random type
    #[instrument(skip(self))]
    pub async fn add_column(&self, table: &str) -> Result<SchemaChangeOutcome, ApplicationError> {
        let (column, column_type) = {
            let mut synthesizer = self.synthesizer.lock();
            (
                synthesizer.identifier(CHURN_COLUMN_PREFIX),
                synthesizer.pick(&COLUMN_TYPES),
            )
        };

        self.database
            .execute(&format!("ALTER TABLE {table} ADD COLUMN {column} {column_type};"))
            .await?;

        info!(%column, column_type, "Column added");
        Ok(SchemaChangeOutcome::ColumnAdded {
            table: table.to_string(),
            column,
            column_type: column_type.to_string(),
        })
    }

    /// Drop a random column previously added by churn
    #[instrument(skip(self))]
    pub async fn drop_column(&self, table: &str) -> Result<SchemaChangeOutcome, ApplicationError> {
        let listing = self
            .database
            .execute(&format!("SHOW COLUMNS FROM {table};"))
            .await?;
        let droppable: Vec<&str> = listing
            .lines()
            .filter_map(|line| line.split('\t').next())
            .filter(|name| {
                !ESSENTIAL_COLUMNS.contains(name) && name.starts_with(CHURN_COLUMN_PREFIX)
            })
            .collect();

        let Some(column) = self.synthesizer.lock().choose(&droppable).map(|c| (*c).to_string())
        else {
            warn!("No droppable columns");
            return Ok(SchemaChangeOutcome::Skipped {
                reason: format!("no droppable {CHURN_COLUMN_PREFIX}* columns in {table}"),
            });
        };

        self.database
            .execute(&format!("ALTER TABLE {table} DROP COLUMN {column};"))
            .await?;

        info!(%column, "Column dropped");
        Ok(SchemaChangeOutcome::ColumnDropped {
            table: table.to_string(),
            column,
        })
    }

    /// Add a narrow column, then widen it
    #[instrument(skip(self))]
    pub async fn alter_column(&self, table: &str) -> Result<SchemaChangeOutcome, ApplicationError> {
        const FROM_TYPE: &str = "VARCHAR(50)";
        const TO_TYPE: &str = "VARCHAR(200)";

        let column = self.synthesizer.lock().identifier(CHURN_COLUMN_PREFIX);
        self.database
            .execute(&format!("ALTER TABLE {table} ADD COLUMN {column} {FROM_TYPE};"))
            .await?;
        self.database
            .execute(&format!("ALTER TABLE {table} MODIFY COLUMN {column} {TO_TYPE};"))
            .await?;

        info!(%column, "Column altered");
        Ok(SchemaChangeOutcome::ColumnAltered {
            table: table.to_string(),
            column,
            from_type: FROM_TYPE.to_string(),
            to_type: TO_TYPE.to_string(),
        })
    }

    /// Create a `test_` table and seed it
    #[instrument(skip(self))]
    pub async fn create_table(&self) -> Result<SchemaChangeOutcome, ApplicationError> {
        let table = self.synthesizer.lock().identifier(CHURN_TABLE_PREFIX);

        self.database
            .execute(&format!(
                "CREATE TABLE {table} (\
                 id INT AUTO_INCREMENT PRIMARY KEY, \
                 data VARCHAR(255), \
                 created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP);"
            ))
            .await?;
        for i in 0..SEED_ROWS {
            self.database
                .execute(&format!("INSERT INTO {table} (data) VALUES ('test data {i}');"))
                .await?;
        }

        info!(%table, rows = SEED_ROWS, "Table created");
        Ok(SchemaChangeOutcome::TableCreated {
            table,
            seeded_rows: SEED_ROWS,
        })
    }

    /// Drop a random `test_` table
    #[instrument(skip(self))]
    pub async fn drop_table(&self) -> Result<SchemaChangeOutcome, ApplicationError> {
        let listing = self.database.execute("SHOW TABLES;").await?;
        let droppable: Vec<&str> = listing
            .lines()
            .map(str::trim)
            .filter(|name| name.starts_with(CHURN_TABLE_PREFIX) && !PROTECTED_TABLES.contains(name))
            .collect();

        let Some(table) = self.synthesizer.lock().choose(&droppable).map(|t| (*t).to_string())
        else {
            warn!("No droppable test tables");
            return Ok(SchemaChangeOutcome::Skipped {
                reason: format!("no {CHURN_TABLE_PREFIX}* tables"),
            });
        };

        self.database
            .execute(&format!("DROP TABLE {table};"))
            .await?;

        info!(%table, "Table dropped");
        Ok(SchemaChangeOutcome::TableDropped { table })
    }

    /// Apply `change` `count` times
    pub async fn apply(
        &self,
        change: SchemaChange,
        table: &str,
        count: u32,
    ) -> Result<Vec<SchemaChangeOutcome>, ApplicationError> {
        if count == 0 {
            return Err(DomainError::invalid("change count must be at least 1").into());
        }

        let mut outcomes = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let outcome = match change {
                SchemaChange::AddColumn => self.add_column(table).await?,
                SchemaChange::DropColumn => self.drop_column(table).await?,
                SchemaChange::AlterColumn => self.alter_column(table).await?,
                SchemaChange::CreateTable => self.create_table().await?,
                SchemaChange::DropTable => self.drop_table().await?,
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::FakeDatabase;

    fn service(database: &FakeDatabase) -> SchemaChurnService {
        SchemaChurnService::new(Arc::new(database.clone())).with_seed(5)
    }

    #[tokio::test]
    async fn add_column_uses_known_type() {
        let database = FakeDatabase::default();

        let outcome = service(&database).add_column("users").await.unwrap();

        let SchemaChangeOutcome::ColumnAdded {
            column,
            column_type,
            ..
        } = outcome
        else {
            panic!("expected column added");
        };
        assert!(column.starts_with("col_"));
        assert!(COLUMN_TYPES.contains(&column_type.as_str()));
        assert_eq!(
            database.committed(),
            [format!("ALTER TABLE users ADD COLUMN {column} {column_type};")]
        );
    }

    #[tokio::test]
    async fn drop_column_only_touches_churn_columns() {
        let database = FakeDatabase::default().responding(
            "SHOW COLUMNS",
            "id\tint\tNO\tPRI\tNULL\tauto_increment\n\
             name\tvarchar(100)\tYES\t\tNULL\t\n\
             email\tvarchar(100)\tYES\t\tNULL\t\n\
             col_abcdef\tint\tYES\t\tNULL\t\n\
             legacy\ttext\tYES\t\tNULL\t\n",
        );

        let outcome = service(&database).drop_column("users").await.unwrap();

        assert_eq!(
            outcome,
            SchemaChangeOutcome::ColumnDropped {
                table: "users".to_string(),
                column: "col_abcdef".to_string()
            }
        );
        assert_eq!(database.committed_matching("DROP COLUMN col_abcdef"), 1);
    }

    #[tokio::test]
    async fn drop_column_without_candidates_skips() {
        let database = FakeDatabase::default().responding("SHOW COLUMNS", "id\tint\nstatus\tvarchar(20)\n");

        let outcome = service(&database).drop_column("users").await.unwrap();

        assert!(matches!(outcome, SchemaChangeOutcome::Skipped { .. }));
        assert_eq!(database.committed_matching("DROP"), 0);
    }

    #[tokio::test]
    async fn alter_column_adds_then_widens() {
        let database = FakeDatabase::default();

        service(&database).alter_column("users").await.unwrap();

        let committed = database.committed();
        assert_eq!(committed.len(), 2);
        assert!(committed[0].ends_with("VARCHAR(50);"));
        assert!(committed[1].contains("MODIFY COLUMN"));
        assert!(committed[1].ends_with("VARCHAR(200);"));
    }

    #[tokio::test]
    async fn create_table_seeds_three_rows() {
        let database = FakeDatabase::default();

        let outcome = service(&database).create_table().await.unwrap();

        let SchemaChangeOutcome::TableCreated { table, seeded_rows } = outcome else {
            panic!("expected table created");
        };
        assert!(table.starts_with("test_"));
        assert_eq!(seeded_rows, 3);
        assert_eq!(database.record_count(&table).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn drop_table_never_touches_protected() {
        let database =
            FakeDatabase::default().responding("SHOW TABLES", "_toolkit_meta\nlarge_data\nusers\n");

        let outcome = service(&database).drop_table().await.unwrap();

        assert!(matches!(outcome, SchemaChangeOutcome::Skipped { .. }));

        let database = FakeDatabase::default().responding("SHOW TABLES", "test_qwerty\nusers\n");
        let outcome = service(&database).drop_table().await.unwrap();
        assert_eq!(
            outcome,
            SchemaChangeOutcome::TableDropped {
                table: "test_qwerty".to_string()
            }
        );
    }

    #[tokio::test]
    async fn apply_repeats_change() {
        let database = FakeDatabase::default();

        let outcomes = service(&database)
            .apply(SchemaChange::AddColumn, "users", 4)
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 4);
        assert_eq!(database.committed_matching("ADD COLUMN"), 4);
    }

    #[tokio::test]
    async fn apply_zero_is_invalid() {
        let err = service(&FakeDatabase::default())
            .apply(SchemaChange::CreateTable, "users", 0)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}

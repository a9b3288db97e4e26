//! Schema churn (DDL) changes

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Columns that schema churn never drops
pub const ESSENTIAL_COLUMNS: [&str; 6] = ["id", "name", "email", "created_at", "updated_at", "status"];

/// Tables that schema churn never drops
pub const PROTECTED_TABLES: [&str; 2] = ["users", "_toolkit_meta"];

/// Column types picked from when adding a column
pub const COLUMN_TYPES: [&str; 6] = [
    "VARCHAR(100)",
    "INT",
    "TEXT",
    "DATETIME",
    "BOOLEAN",
    "DECIMAL(10,2)",
];

/// A DDL change that exercises schema-aware consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaChange {
    /// Add a randomly named, randomly typed column
    AddColumn,
    /// Drop a previously added column
    DropColumn,
    /// Add a column and widen it
    AlterColumn,
    /// Create a seeded test table
    CreateTable,
    /// Drop a previously created test table
    DropTable,
}

impl SchemaChange {
    /// All changes
    #[must_use]
    pub const fn all() -> [Self; 5] {
        [
            Self::AddColumn,
            Self::DropColumn,
            Self::AlterColumn,
            Self::CreateTable,
            Self::DropTable,
        ]
    }
}

impl fmt::Display for SchemaChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AddColumn => "add-column",
            Self::DropColumn => "drop-column",
            Self::AlterColumn => "alter-column",
            Self::CreateTable => "create-table",
            Self::DropTable => "drop-table",
        })
    }
}

impl FromStr for SchemaChange {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|change| change.to_string() == s.trim())
            .ok_or_else(|| DomainError::Unrecognized {
                kind: "schema change",
                value: s.to_string(),
            })
    }
}

/// Result of one schema change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SchemaChangeOutcome {
    /// Column added
    ColumnAdded {
        table: String,
        column: String,
        column_type: String,
    },
    /// Column dropped
    ColumnDropped { table: String, column: String },
    /// Column added then widened
    ColumnAltered {
        table: String,
        column: String,
        from_type: String,
        to_type: String,
    },
    /// Table created and seeded
    TableCreated { table: String, seeded_rows: u32 },
    /// Table dropped
    TableDropped { table: String },
    /// Nothing suitable to act on
    Skipped { reason: String },
}

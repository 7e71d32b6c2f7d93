//! Schema snapshot types.
//!
//! Represents the structure of the connected database as reported by the
//! assistant service: tables, their columns, and free-form metadata.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::service::null_as_default;

/// Immutable, session-scoped copy of the database schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemaSnapshot {
    /// Catalog / database name. SQLite reports none.
    #[serde(deserialize_with = "null_as_default")]
    pub database_name: String,

    /// Tables in the order the service listed them.
    #[serde(deserialize_with = "null_as_default")]
    pub tables: Vec<TableInfo>,

    /// Product name, driver version and similar scalars.
    #[serde(deserialize_with = "null_as_default")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl SchemaSnapshot {
    /// Creates an empty snapshot for the given database.
    pub fn new(database_name: impl Into<String>) -> Self {
        Self {
            database_name: database_name.into(),
            ..Self::default()
        }
    }

    /// Adds a table, keeping insertion order.
    pub fn with_table(mut self, table: TableInfo) -> Self {
        self.tables.push(table);
        self
    }

    /// Returns the tables whose name, or any column name, contains `term`
    /// case-insensitively. An empty term matches every table. Snapshot
    /// order is preserved.
    pub fn filter(&self, term: &str) -> Vec<&TableInfo> {
        let needle = term.to_lowercase();
        self.tables
            .iter()
            .filter(|table| table.matches(&needle))
            .collect()
    }

    /// Adds a metadata entry such as `databaseProductName`.
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// A metadata entry as display text. Missing and `null` entries are `None`.
    pub fn metadata_text(&self, key: &str) -> Option<String> {
        match self.metadata.get(key)? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Looks up a table by exact name.
    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Formats the schema as plain-text context for SQL generation.
    pub fn format_for_prompt(&self) -> String {
        let tables_text = self
            .tables
            .iter()
            .map(Self::format_table_for_prompt)
            .collect::<Vec<_>>()
            .join("");

        if self.database_name.is_empty() {
            format!("Database Schema:\n\n{}", tables_text)
        } else {
            format!("Database Schema ({}):\n\n{}", self.database_name, tables_text)
        }
    }

    fn format_table_for_prompt(table: &TableInfo) -> String {
        let column_lines = table
            .columns
            .iter()
            .map(|column| {
                let annotations = column.annotations();
                if annotations.is_empty() {
                    format!("  - {}: {}\n", column.name, column.column_type)
                } else {
                    format!(
                        "  - {}: {} ({})\n",
                        column.name,
                        column.column_type,
                        annotations.join(", ")
                    )
                }
            })
            .collect::<Vec<_>>()
            .join("");

        format!("Table: {}\n{}\n", table.name, column_lines)
    }
}

/// A table and its columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(deserialize_with = "null_as_default")]
    pub columns: Vec<ColumnInfo>,

    /// Owning schema, when the database has schemas.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl TableInfo {
    /// Creates a table with no columns.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a column, keeping insertion order.
    pub fn with_column(mut self, column: ColumnInfo) -> Self {
        self.columns.push(column);
        self
    }

    /// `needle` must already be lowercase.
    fn matches(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.name.to_lowercase().contains(needle)
            || self
                .columns
                .iter()
                .any(|c| c.name.to_lowercase().contains(needle))
    }

    /// Names of the primary key columns, in column order.
    pub fn primary_key(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }
}

/// A column in a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,

    /// Vendor type name, e.g. `VARCHAR(255)`.
    #[serde(deserialize_with = "null_as_default")]
    pub column_type: String,

    pub nullable: bool,

    pub is_primary_key: bool,

    pub is_auto_increment: bool,

    /// JDBC type code or generic type, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Default for ColumnInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            column_type: String::new(),
            nullable: true,
            is_primary_key: false,
            is_auto_increment: false,
            data_type: None,
            default_value: None,
            comment: None,
        }
    }
}

impl ColumnInfo {
    /// Creates a nullable, non-key column.
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            ..Self::default()
        }
    }

    /// Marks the column as the (non-null) primary key.
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.is_auto_increment = true;
        self
    }

    /// Short badges: `PK`, `NOT NULL`, `AUTO`.
    pub fn annotations(&self) -> Vec<&'static str> {
        [
            self.is_primary_key.then_some("PK"),
            (!self.nullable).then_some("NOT NULL"),
            self.is_auto_increment.then_some("AUTO"),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

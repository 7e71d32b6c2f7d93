//! Execution outcome types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::service::{is_success, ExecutionPayload};

/// One result row: column name to cell value, in column order.
pub type Row = serde_json::Map<String, Value>;

/// Message stored when a failed execution carries no text of its own.
pub const EXECUTION_FAILED_FALLBACK: &str = "Query execution failed";

/// Rows returned by a successful execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    pub rows: Vec<Row>,
    pub column_names: Vec<String>,
    pub column_types: Vec<String>,
    /// Count reported by the service; may differ from `rows.len()`.
    pub row_count: u64,
    pub elapsed_ms: u64,
}

impl ResultSet {
    /// Returns the cell at `row`/`column` formatted for display.
    pub fn cell(&self, row: usize, column: &str) -> String {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(display_value)
            .unwrap_or_default()
    }
}

/// Result of the most recent execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ExecutionOutcome {
    Success(ResultSet),
    Failure { message: String },
}

impl ExecutionOutcome {
    /// Builds a failure, substituting the fallback for blank messages.
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            EXECUTION_FAILED_FALLBACK.to_string()
        } else {
            message
        };
        Self::Failure { message }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn result_set(&self) -> Option<&ResultSet> {
        match self {
            Self::Success(set) => Some(set),
            Self::Failure { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure { message } => Some(message),
        }
    }

    /// Short tag for headless state assertions: `success` or `failure`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Failure { .. } => "failure",
        }
    }
}

impl From<ExecutionPayload> for ExecutionOutcome {
    /// Anything but a `SUCCESS` status is a failure carrying the payload's
    /// error text.
    fn from(payload: ExecutionPayload) -> Self {
        if !is_success(&payload.status) {
            return Self::failure(payload.error.unwrap_or_default());
        }
        Self::Success(ResultSet {
            rows: payload.results,
            column_names: payload.column_names,
            column_types: payload.column_types,
            row_count: payload.row_count,
            elapsed_ms: payload.execution_time_ms,
        })
    }
}

/// Formats a cell value for display. Null renders as an empty string.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

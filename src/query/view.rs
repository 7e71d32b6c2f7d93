//! Display policy for execution results.

use super::{ExecutionOutcome, ResultSet, Row};

/// Row limit sent with every execution request.
pub const EXECUTION_LIMIT: u32 = 100;

/// Rows shown in the results panel.
pub const PREVIEW_ROWS: usize = 10;

/// What the results panel shows for an outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultView<'a> {
    Table {
        columns: &'a [String],
        rows: &'a [Row],
        /// Set when more rows were returned than are shown.
        note: Option<String>,
        label: String,
    },
    Error(&'a str),
}

impl<'a> ResultView<'a> {
    pub fn of(outcome: &'a ExecutionOutcome) -> Self {
        match outcome {
            ExecutionOutcome::Success(set) => Self::table(set),
            ExecutionOutcome::Failure { message } => Self::Error(message),
        }
    }

    fn table(set: &'a ResultSet) -> Self {
        let shown = set.rows.len().min(PREVIEW_ROWS);
        Self::Table {
            columns: &set.column_names,
            rows: &set.rows[..shown],
            note: truncation_note(set),
            label: summary_label(set),
        }
    }
}

/// `"showing first 10 of K"` when K > 10 rows came back.
///
/// Based on rows actually returned, not the reported row count.
pub fn truncation_note(set: &ResultSet) -> Option<String> {
    (set.rows.len() > PREVIEW_ROWS)
        .then(|| format!("showing first {} of {}", PREVIEW_ROWS, set.rows.len()))
}

/// `"<rowCount> rows, <elapsedMs>ms"`, using the reported row count.
pub fn summary_label(set: &ResultSet) -> String {
    format!("{} rows, {}ms", set.row_count, set.elapsed_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn result_set(rows: usize, row_count: u64) -> ResultSet {
        ResultSet {
            rows: (0..rows)
                .map(|i| json!({ "id": i }).as_object().cloned().unwrap())
                .collect(),
            column_names: vec!["id".to_string()],
            column_types: vec!["INTEGER".to_string()],
            row_count,
            elapsed_ms: 4,
        }
    }

    #[test]
    fn test_small_result_has_no_note() {
        let set = result_set(1, 1);
        assert_eq!(truncation_note(&set), None);
        assert_eq!(summary_label(&set), "1 rows, 4ms");
    }

    #[test]
    fn test_exactly_ten_rows_has_no_note() {
        assert_eq!(truncation_note(&result_set(10, 10)), None);
    }

    #[test]
    fn test_large_result_is_truncated() {
        let outcome = ExecutionOutcome::Success(result_set(37, 37));
        match ResultView::of(&outcome) {
            ResultView::Table { rows, note, label, .. } => {
                assert_eq!(rows.len(), 10);
                assert_eq!(rows[9]["id"], json!(9));
                assert_eq!(note.as_deref(), Some("showing first 10 of 37"));
                assert_eq!(label, "37 rows, 4ms");
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_note_uses_returned_rows_label_uses_reported_count() {
        let set = result_set(3, 250);
        assert_eq!(truncation_note(&set), None);
        assert_eq!(summary_label(&set), "250 rows, 4ms");
    }

    #[test]
    fn test_failure_view() {
        let outcome = ExecutionOutcome::failure("no such table: userz");
        assert_eq!(ResultView::of(&outcome), ResultView::Error("no such table: userz"));
    }
}

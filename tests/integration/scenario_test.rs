//! The full connect, browse, generate, execute flow.

use pretty_assertions::assert_eq;
use serde_json::json;
use sql_assistant::app::Assistant;
use sql_assistant::connection::{ConnectionParams, DatabaseKind};
use sql_assistant::query::{summary_label, truncation_note, ExecutionOutcome, ResultView};
use sql_assistant::render;
use sql_assistant::schema::{ColumnInfo, SchemaSnapshot, TableInfo};
use sql_assistant::service::{ExecutionPayload, GeneratedQuery, MockService};
use std::sync::Arc;

fn sqlite_mock() -> MockService {
    let schema = SchemaSnapshot::new("app")
        .with_table(
            TableInfo::new("users")
                .with_column(ColumnInfo::new("id", "INTEGER").primary_key())
                .with_column(ColumnInfo::new("email", "TEXT")),
        )
        .with_table(TableInfo::new("orders").with_column(ColumnInfo::new("id", "INTEGER")));

    let row = json!({"id": 1, "email": "a@b.c"}).as_object().cloned().unwrap();

    MockService::new()
        .with_connection_id("c-1")
        .with_schema(schema)
        .with_generation(
            "all users",
            GeneratedQuery::new("SELECT * FROM users;", "Lists every user."),
        )
        .with_execution(
            "SELECT * FROM users;",
            ExecutionPayload::success(&[("id", "INTEGER"), ("email", "TEXT")], vec![row], 4),
        )
}

#[tokio::test]
async fn test_sqlite_end_to_end() {
    let mock = sqlite_mock();
    let mut assistant = Assistant::new(Arc::new(mock.clone()));

    let id = assistant
        .connect(ConnectionParams::new(DatabaseKind::Sqlite, "/tmp/t.db"))
        .await
        .unwrap();
    assert_eq!(id.as_str(), "c-1");

    let names: Vec<String> = assistant
        .search_schema("ema")
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, vec!["users"]);

    assistant.submit_prompt("show all users").await.unwrap();
    assert_eq!(assistant.draft_text(), "SELECT * FROM users;");

    let set = assistant.execute().await.unwrap().completed().unwrap();
    assert_eq!(set.rows.len(), 1);
    assert_eq!(truncation_note(&set), None);
    assert_eq!(summary_label(&set), "1 rows, 4ms");

    let outcome = assistant.outcome().unwrap();
    match ResultView::of(&outcome) {
        ResultView::Table { rows, note, label, .. } => {
            assert_eq!(rows.len(), 1);
            assert_eq!(note, None);
            assert_eq!(label, "1 rows, 4ms");
        }
        ResultView::Error(message) => panic!("unexpected error view: {message}"),
    }

    let screen = render::render_screen(&assistant);
    assert!(screen.contains("Connected to SQLITE database: /tmp/t.db (ID: c-1)"));
    assert!(screen.contains("Search: ema\nTables (1)\n  users (2 columns)"));
    assert!(screen.contains("Query executed successfully (1 rows, 4ms)"));
    assert!(screen.contains("| 1  | a@b.c |"));
}

#[tokio::test]
async fn test_demo_flow_with_truncated_preview() {
    let mut assistant = Assistant::new(Arc::new(MockService::demo()));
    assistant
        .connect(ConnectionParams::new(DatabaseKind::MySql, "shop").with_host("db", None))
        .await
        .unwrap();

    assistant.submit_prompt("list all users please").await.unwrap();
    assistant.execute().await.unwrap();

    let outcome = assistant.outcome().unwrap();
    let set = outcome.result_set().unwrap();
    assert_eq!(set.rows.len(), 12);
    assert_eq!(truncation_note(set).as_deref(), Some("showing first 10 of 12"));
    assert!(render::render_screen(&assistant).contains("(showing first 10 of 12)"));
}

#[tokio::test]
async fn test_edit_then_execute_failure_keeps_conversation() {
    let mut assistant = Assistant::new(Arc::new(sqlite_mock()));
    assistant
        .connect(ConnectionParams::new(DatabaseKind::Sqlite, "/tmp/t.db"))
        .await
        .unwrap();

    assistant.edit_sql("SELECT * FROM userz;").unwrap();
    let err = assistant.execute().await.unwrap_err();
    assert_eq!(err.category(), "Execution Error");

    match assistant.outcome() {
        Some(ExecutionOutcome::Failure { message }) => {
            assert!(message.contains("SELECT * FROM userz;"))
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(assistant.workspace().unwrap().conversation().len(), 1);
}

//! Execution through the assistant: request shape and outcome replacement.

use pretty_assertions::assert_eq;
use serde_json::json;
use sql_assistant::app::Assistant;
use sql_assistant::connection::{ConnectionParams, DatabaseKind};
use sql_assistant::dispatch::Dispatch;
use sql_assistant::query::{ExecutionOutcome, EXECUTION_LIMIT};
use sql_assistant::service::{ExecutionPayload, MockService};
use std::sync::Arc;

async fn connected(mock: &MockService) -> Assistant {
    let mut assistant = Assistant::new(Arc::new(mock.clone()));
    assistant
        .connect(ConnectionParams::new(DatabaseKind::MySql, "shop").with_host("db", Some(3307)))
        .await
        .unwrap();
    assistant
}

#[tokio::test]
async fn test_request_carries_session_limit_and_sql() {
    let mock = MockService::demo().with_connection_id("m-7");
    let assistant = connected(&mock).await;
    assistant.edit_sql("SELECT * FROM users;").unwrap();
    assistant.execute().await.unwrap();

    let request = &mock.execution_requests()[0];
    assert_eq!(request.sql, "SELECT * FROM users;");
    assert_eq!(request.connection_id.as_str(), "m-7");
    assert_eq!(request.limit, Some(EXECUTION_LIMIT));
    assert!(!request.dry_run);
    assert_eq!(request.params.port, Some(3307));
}

#[tokio::test]
async fn test_blank_draft_is_not_sent() {
    let mock = MockService::demo();
    let assistant = connected(&mock).await;

    assert_eq!(assistant.execute().await.unwrap(), Dispatch::Blank);
    assert_eq!(mock.counts().execute, 0);
    assert!(assistant.outcome().is_none());
}

#[tokio::test]
async fn test_outcome_is_replaced_by_each_execution() {
    let mock = MockService::demo();
    let assistant = connected(&mock).await;

    assistant.edit_sql("SELECT * FROM userz;").unwrap();
    assert!(assistant.execute().await.is_err());
    assert!(!assistant.outcome().unwrap().is_success());

    assistant.edit_sql("SELECT COUNT(*) AS order_count FROM orders;").unwrap();
    let set = assistant.execute().await.unwrap().completed().unwrap();
    assert_eq!(set.cell(0, "order_count"), "42");
    assert!(assistant.outcome().unwrap().is_success());
}

#[tokio::test]
async fn test_reported_row_count_is_only_a_label() {
    let row = json!({"n": 1}).as_object().cloned().unwrap();
    let mock = MockService::new().with_execution(
        "SELECT n FROM t",
        ExecutionPayload::success(&[("n", "INTEGER")], vec![row], 2).with_row_count(500),
    );
    let assistant = connected(&mock).await;
    assistant.edit_sql("select n from t;").unwrap();
    assistant.execute().await.unwrap();

    let text = sql_assistant::render::render_screen(&assistant);
    assert!(text.contains("Query executed successfully (500 rows, 2ms)"));
    assert!(!text.contains("showing first"));
}

#[tokio::test]
async fn test_service_error_becomes_failure_outcome() {
    let mock = MockService::demo();
    let assistant = connected(&mock).await;
    mock.fail_execution("Table 'shop.userz' doesn't exist");

    assistant.edit_sql("SELECT * FROM userz;").unwrap();
    let err = assistant.execute().await.unwrap_err();
    assert_eq!(err.message(), "Table 'shop.userz' doesn't exist");
    assert_eq!(
        assistant.outcome(),
        Some(ExecutionOutcome::failure("Table 'shop.userz' doesn't exist"))
    );
}

#[tokio::test]
async fn test_generation_and_execution_run_concurrently() {
    let mock = MockService::demo().gated();
    let assistant = connected(&mock).await;
    assistant.edit_sql("SELECT * FROM users;").unwrap();

    let (generated, executed, ()) = futures::join!(
        assistant.submit_prompt("count orders"),
        assistant.execute(),
        async { mock.release(2) },
    );

    assert!(generated.unwrap().is_completed());
    assert_eq!(executed.unwrap().completed().unwrap().rows.len(), 12);
    assert_eq!(mock.execution_requests()[0].sql, "SELECT * FROM users;");
    assert_eq!(
        assistant.draft_text(),
        "SELECT COUNT(*) AS order_count FROM orders;"
    );
}

//! Generation through the assistant: conversation and draft effects.

use pretty_assertions::assert_eq;
use sql_assistant::app::Assistant;
use sql_assistant::connection::{ConnectionParams, DatabaseKind};
use sql_assistant::conversation::Role;
use sql_assistant::dispatch::Dispatch;
use sql_assistant::generation::GENERATION_FAILED_MESSAGE;
use sql_assistant::service::MockService;
use std::sync::Arc;
use tokio_test::{assert_pending, assert_ready, task};

async fn connected(mock: &MockService) -> Assistant {
    let mut assistant = Assistant::new(Arc::new(mock.clone()));
    assistant
        .connect(ConnectionParams::new(DatabaseKind::Sqlite, "/tmp/t.db"))
        .await
        .unwrap();
    assistant
}

#[tokio::test]
async fn test_each_success_adds_two_entries() {
    let mock = MockService::demo();
    let assistant = connected(&mock).await;

    assistant.submit_prompt("all users").await.unwrap();
    assistant.submit_prompt("count orders").await.unwrap();

    let entries = assistant.workspace().unwrap().conversation().entries();
    let roles: Vec<Role> = entries.iter().map(|e| e.role).collect();
    assert_eq!(
        roles,
        vec![Role::System, Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
    assert!(entries.windows(2).all(|w| w[0].id < w[1].id));
    assert_eq!(
        assistant.draft_text(),
        "SELECT COUNT(*) AS order_count FROM orders;"
    );
}

#[tokio::test]
async fn test_failure_leaves_draft_and_adds_notice() {
    let mock = MockService::demo();
    let assistant = connected(&mock).await;
    assistant.edit_sql("SELECT 42;").unwrap();

    mock.fail_generation("Service unavailable");
    let err = assistant.submit_prompt("all users").await.unwrap_err();
    assert_eq!(err.category(), "Generation Error");

    let last = assistant.workspace().unwrap().conversation().last().unwrap();
    assert_eq!(last.role, Role::System);
    assert_eq!(last.text, GENERATION_FAILED_MESSAGE);
    assert_eq!(assistant.draft_text(), "SELECT 42;");
}

#[tokio::test]
async fn test_blank_prompt_sends_nothing() {
    let mock = MockService::demo();
    let assistant = connected(&mock).await;

    assert_eq!(assistant.submit_prompt("   ").await.unwrap(), Dispatch::Blank);
    assert_eq!(mock.counts().generate, 0);
}

#[tokio::test]
async fn test_schema_context_is_sent_with_prompt() {
    let mock = MockService::demo();
    let assistant = connected(&mock).await;
    assistant.submit_prompt("all users").await.unwrap();

    let request = &mock.generation_requests()[0];
    let schema = request.context["schema"].as_str().unwrap();
    assert!(schema.contains("users"));
    assert!(schema.contains("orders"));
}

#[tokio::test]
async fn test_reset_discards_pending_generation() {
    let mock = MockService::demo().gated();
    let assistant = connected(&mock).await;
    let generation = assistant.workspace().unwrap().generation().clone();
    let log = assistant.workspace().unwrap().conversation().clone();

    let mut call = task::spawn(async move { generation.generate("all users").await });
    assert_pending!(call.poll());

    let mut assistant = assistant;
    assistant.reset();
    mock.release(1);

    assert_eq!(assert_ready!(call.poll()).unwrap(), Dispatch::Discarded);
    assert_eq!(log.len(), 1);
}

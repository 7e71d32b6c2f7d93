//! Schema loading and search through the assistant.

use pretty_assertions::assert_eq;
use sql_assistant::app::Assistant;
use sql_assistant::connection::{ConnectionParams, DatabaseKind};
use sql_assistant::schema::SchemaState;
use sql_assistant::service::MockService;
use std::sync::Arc;

async fn connected(mock: &MockService) -> Assistant {
    let mut assistant = Assistant::new(Arc::new(mock.clone()));
    assistant
        .connect(ConnectionParams::new(DatabaseKind::Sqlite, "/tmp/t.db"))
        .await
        .unwrap();
    assistant
}

fn names(assistant: &Assistant, term: &str) -> Vec<String> {
    assistant
        .search_schema(term)
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect()
}

#[tokio::test]
async fn test_search_matches_tables_and_columns() {
    let assistant = connected(&MockService::demo()).await;

    assert_eq!(names(&assistant, ""), vec!["users", "orders", "products"]);
    assert_eq!(names(&assistant, "ORD"), vec!["orders"]);
    assert_eq!(names(&assistant, "price"), vec!["products"]);
    assert_eq!(names(&assistant, "name"), vec!["users", "products"]);
    assert!(names(&assistant, "zzz").is_empty());
}

#[tokio::test]
async fn test_schema_is_fetched_once_per_session() {
    let mock = MockService::demo();
    let assistant = connected(&mock).await;

    assistant.reload_schema().await.unwrap();
    assistant.search_schema("users").unwrap();
    assert_eq!(mock.counts().schema, 1);
}

#[tokio::test]
async fn test_failed_schema_can_be_retried() {
    let mock = MockService::demo();
    mock.fail_schema("Access denied");
    let assistant = connected(&mock).await;

    let schema = assistant.workspace().unwrap().schema();
    assert_eq!(schema.state(), SchemaState::Failed("Access denied".to_string()));
    assert!(sql_assistant::render::render_screen(&assistant)
        .contains("Failed to load schema: Access denied"));
    assert!(assistant.search_schema("users").unwrap().is_empty());

    mock.clear_failures();
    assert!(assistant.reload_schema().await.unwrap().is_completed());
    assert_eq!(names(&assistant, "users"), vec!["users"]);
}

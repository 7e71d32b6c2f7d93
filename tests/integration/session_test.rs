//! Connecting, reconnecting and resetting sessions.

use pretty_assertions::assert_eq;
use sql_assistant::app::Assistant;
use sql_assistant::connection::{ConnectionParams, DatabaseKind};
use sql_assistant::service::MockService;
use std::sync::Arc;

fn postgres() -> ConnectionParams {
    ConnectionParams::new(DatabaseKind::PostgreSql, "shop")
        .with_host("db.internal", None)
        .with_credentials("app", Some("secret".to_string()))
}

#[tokio::test]
async fn test_probe_receives_normalized_params() {
    let mock = MockService::demo();
    let mut assistant = Assistant::new(Arc::new(mock.clone()));

    let params =
        ConnectionParams::new(DatabaseKind::Sqlite, "  /tmp/t.db ").with_host("ignored", Some(1));
    assistant.connect(params).await.unwrap();

    let stored = assistant.session().unwrap().params();
    assert_eq!(stored.database, "/tmp/t.db");
    assert_eq!(stored.host, None);
    assert_eq!(stored.port, None);
}

#[tokio::test]
async fn test_session_id_comes_from_probe() {
    let mock = MockService::demo();
    let mut assistant = Assistant::new(Arc::new(mock.clone()));

    let id = assistant.connect(postgres()).await.unwrap();
    assert_eq!(id.as_str(), mock.connection_id_for(&postgres().normalized()));
    assert_eq!(assistant.session().unwrap().id(), &id);
}

#[tokio::test]
async fn test_banner_never_shows_password() {
    let mut assistant = Assistant::new(Arc::new(MockService::demo().with_connection_id("x1")));
    assistant.connect(postgres()).await.unwrap();

    let banner = assistant.session().unwrap().banner();
    assert_eq!(banner, "Connected to POSTGRESQL database: shop (ID: x1)");
    assert!(!banner.contains("secret"));
}

#[tokio::test]
async fn test_reconnect_replaces_session_and_state() {
    let mock = MockService::demo();
    let mut assistant = Assistant::new(Arc::new(mock.clone()));

    let first = assistant.connect(postgres()).await.unwrap();
    assistant.submit_prompt("all users").await.unwrap();
    let old_lifetime = assistant.workspace().unwrap().lifetime();

    let second = assistant
        .connect(ConnectionParams::new(DatabaseKind::H2, "mem:test"))
        .await
        .unwrap();

    assert_ne!(first, second);
    assert!(old_lifetime.is_cancelled());
    let workspace = assistant.workspace().unwrap();
    assert_eq!(workspace.conversation().len(), 1);
    assert!(workspace.draft().is_blank());
    assert_eq!(mock.counts().probe, 2);
    assert_eq!(mock.counts().schema, 2);
}

#[tokio::test]
async fn test_failed_connect_shows_error_on_form() {
    let mock = MockService::demo();
    mock.fail_probe("Connection refused");
    let mut assistant = Assistant::new(Arc::new(mock));

    assert!(assistant.connect(postgres()).await.is_err());
    let screen = sql_assistant::render::render_screen(&assistant);
    assert_eq!(screen, "== Connection ==\nNot connected\nError: Connection refused\n");
}

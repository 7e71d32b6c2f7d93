//! HTTP service tests.
//!
//! The stub tests serve canned responses from a local socket. The live test
//! needs a running backend: set SQL_ASSISTANT_API_URL and
//! SQL_ASSISTANT_TEST_DATABASE (a connection URL such as sqlite:/tmp/app.db).

use sql_assistant::config::ConnectionConfig;
use sql_assistant::connection::{ConnectionParams, DatabaseKind, SessionId};
use sql_assistant::service::{
    AssistantService, ExecutionRequest, ExplainRequest, GenerationRequest, HttpService,
    HttpServiceConfig, ValidationRequest,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Serves one canned response and returns the raw request it received.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        request
    });

    (format!("http://{addr}/api"), handle)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(end) = text.find("\r\n\r\n") {
            let content_length = text[..end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn service(base_url: &str) -> HttpService {
    let config = HttpServiceConfig::new(base_url)
        .with_timeout(5)
        .with_auth_token("tok");
    HttpService::new(config).unwrap()
}

fn sqlite() -> ConnectionParams {
    ConnectionParams::new(DatabaseKind::Sqlite, "/tmp/t.db")
}

#[tokio::test]
async fn test_probe_posts_params_with_bearer_token() {
    let (url, server) = serve_once(
        "200 OK",
        r#"{"connectionId":"abc","status":"SUCCESS","message":"Connection established"}"#,
    )
    .await;

    let probe = service(&url).test_connection(&sqlite()).await.unwrap();
    assert_eq!(probe.connection_id, "abc");
    assert_eq!(probe.status, "SUCCESS");

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/database/test-connection HTTP/1.1"));
    assert!(request.to_lowercase().contains("authorization: bearer tok"));
    assert!(request.contains(r#""type":"SQLITE""#));
    assert!(request.contains(r#""database":"/tmp/t.db""#));
}

#[tokio::test]
async fn test_generate_sends_connection_id_query() {
    let (url, server) = serve_once(
        "200 OK",
        r#"{"query":{"generatedSql":"SELECT 1;","explanation":"One.","executable":true},"status":"SUCCESS"}"#,
    )
    .await;

    let request = GenerationRequest {
        natural_language_query: "one".to_string(),
        connection_id: SessionId::from("abc"),
        params: sqlite(),
        context: serde_json::Map::new(),
    };
    let response = service(&url).generate(&request).await.unwrap();
    assert_eq!(response.query.generated_sql, "SELECT 1;");
    assert!(response.query.is_executable);

    let raw = server.await.unwrap();
    assert!(raw.starts_with("POST /api/query/generate?connectionId=abc HTTP/1.1"));
    assert!(raw.contains(r#""naturalLanguageQuery":"one""#));
    assert!(raw.contains(r#""connectionDto":{"#));
}

#[tokio::test]
async fn test_server_error_message_is_surfaced() {
    let (url, _server) =
        serve_once("500 Internal Server Error", r#"{"message":"Syntax error near 'FORM'"}"#).await;

    let request = ExecutionRequest {
        sql: "SELECT * FORM users".to_string(),
        connection_id: SessionId::from("abc"),
        params: sqlite(),
        limit: Some(100),
        offset: None,
        dry_run: false,
    };
    let err = service(&url).execute(&request).await.unwrap_err();
    assert_eq!(err.category(), "Execution Error");
    assert_eq!(err.message(), "Syntax error near 'FORM'");
}

#[tokio::test]
async fn test_schema_with_null_catalog_parses() {
    let (url, _server) = serve_once(
        "200 OK",
        r#"{"connectionId":"abc","schema":{"databaseName":null,"tables":[{"name":"users","schema":null,"type":"TABLE","columns":[{"name":"id","dataType":"4","columnType":"INTEGER","nullable":false,"isPrimaryKey":true,"isAutoIncrement":false,"defaultValue":null,"comment":null,"maxLength":null,"precision":null,"scale":null}],"indexes":[],"foreignKeys":[],"comment":null}],"views":[],"metadata":{"databaseProductName":"SQLite","databaseProductVersion":"3.45.1","catalogTerm":null}},"status":"SUCCESS"}"#,
    )
    .await;

    let response = service(&url)
        .fetch_schema(&sqlite(), &SessionId::from("abc"))
        .await
        .unwrap();
    assert_eq!(response.schema.database_name, "");
    assert_eq!(response.schema.tables[0].name, "users");
    assert_eq!(
        response.schema.metadata_text("databaseProductName").as_deref(),
        Some("SQLite")
    );
}

#[tokio::test]
async fn test_validate_is_sessionless() {
    let (url, server) = serve_once(
        "200 OK",
        r#"{"validation":{"isValid":true,"errors":[],"warnings":[],"suggestions":["Consider adding a WHERE clause or LIMIT to avoid scanning entire tables"],"sanitizedQuery":"SELECT * FROM users;"},"status":"SUCCESS"}"#,
    )
    .await;

    let response = service(&url)
        .validate(&ValidationRequest {
            sql: "SELECT * FROM users".to_string(),
        })
        .await
        .unwrap();
    assert!(response.validation.is_valid);
    assert_eq!(
        response.validation.sanitized_query.as_deref(),
        Some("SELECT * FROM users;")
    );

    let raw = server.await.unwrap();
    assert!(raw.starts_with("POST /api/query/validate HTTP/1.1"));
    assert!(raw.contains(r#"{"sql":"SELECT * FROM users"}"#));
}

#[tokio::test]
async fn test_explain_error_is_review_error() {
    let (url, server) = serve_once(
        "500 Internal Server Error",
        r#"{"status":"ERROR","message":"Failed to generate explanation"}"#,
    )
    .await;

    let request = ExplainRequest {
        sql: "SELECT 1".to_string(),
        connection_id: SessionId::from("abc"),
        params: sqlite(),
    };
    let err = service(&url).explain(&request).await.unwrap_err();
    assert_eq!(err.category(), "Review Error");
    assert_eq!(err.message(), "Failed to generate explanation");

    let raw = server.await.unwrap();
    assert!(raw.starts_with("POST /api/query/explain?connectionId=abc HTTP/1.1"));
}

#[tokio::test]
async fn test_unauthorized_is_transport_error() {
    let (url, _server) = serve_once("401 Unauthorized", "").await;

    let err = service(&url).test_connection(&sqlite()).await.unwrap_err();
    assert_eq!(err.category(), "Transport Error");
}

#[tokio::test]
async fn test_live_backend_round_trip() {
    let (Ok(url), Ok(database)) = (
        std::env::var("SQL_ASSISTANT_API_URL"),
        std::env::var("SQL_ASSISTANT_TEST_DATABASE"),
    ) else {
        eprintln!("Skipping test: SQL_ASSISTANT_API_URL or SQL_ASSISTANT_TEST_DATABASE not set");
        return;
    };

    let params = ConnectionConfig::from_connection_string(&database)
        .unwrap()
        .to_params()
        .unwrap();
    let service = HttpService::new(HttpServiceConfig::new(url)).unwrap();

    let probe = service.test_connection(&params).await.unwrap();
    assert!(!probe.connection_id.is_empty());

    let schema = service
        .fetch_schema(&params, &SessionId::new(probe.connection_id))
        .await
        .unwrap();
    assert_eq!(schema.status.to_uppercase(), "SUCCESS");
}

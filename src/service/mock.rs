//! In-memory assistant service for tests and headless runs.
//!
//! Responses are canned: generation matches prompt patterns, execution
//! and explanation match normalized SQL, and validation applies a few
//! keyword rules. Failures can be injected per operation at any
//! time, and an optional gate holds generate/execute calls until released
//! so tests can observe requests while they are in flight.

use async_trait::async_trait;
use serde_json::json;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tracing::debug;

use super::{
    AssistantService, ExecutionPayload, ExecutionRequest, ExecutionResponse, ExplainRequest,
    ExplanationResponse, GeneratedQuery, GenerationRequest, GenerationResponse, ProbeResponse,
    QueryValidation, SchemaResponse, ValidationRequest, ValidationResponse, STATUS_SUCCESS,
};
use crate::connection::{ConnectionParams, SessionId};
use crate::dispatch::lock;
use crate::error::{AssistantError, Result};
use crate::query::Row;
use crate::schema::{ColumnInfo, SchemaSnapshot, TableInfo};

/// Number of calls the mock has received, per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub probe: usize,
    pub schema: usize,
    pub generate: usize,
    pub execute: usize,
    pub validate: usize,
    pub explain: usize,
}

#[derive(Debug, Default)]
struct Counters {
    probe: AtomicUsize,
    schema: AtomicUsize,
    generate: AtomicUsize,
    execute: AtomicUsize,
    validate: AtomicUsize,
    explain: AtomicUsize,
}

#[derive(Debug, Default)]
struct Failures {
    probe: Option<String>,
    schema: Option<String>,
    generate: Option<String>,
    execute: Option<String>,
    review: Option<String>,
}

#[derive(Debug, Default)]
struct Recorded {
    generations: Vec<GenerationRequest>,
    executions: Vec<ExecutionRequest>,
}

/// Assistant service backed by canned data.
#[derive(Debug, Clone, Default)]
pub struct MockService {
    schema: SchemaSnapshot,
    generations: Vec<(String, GeneratedQuery)>,
    executions: Vec<(String, ExecutionPayload)>,
    explanations: Vec<(String, String)>,
    connection_id: Option<String>,
    gate: Option<Arc<Semaphore>>,
    failures: Arc<Mutex<Failures>>,
    counters: Arc<Counters>,
    recorded: Arc<Mutex<Recorded>>,
}

impl MockService {
    /// Creates a mock with an empty schema and no canned responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock with a small shop database: users, orders and
    /// products, plus generations and results for a few common questions.
    pub fn demo() -> Self {
        let schema = SchemaSnapshot::new("shop")
            .with_table(
                TableInfo::new("users")
                    .with_column(ColumnInfo::new("id", "INTEGER").primary_key().auto_increment())
                    .with_column(ColumnInfo::new("email", "VARCHAR(255)").not_null())
                    .with_column(ColumnInfo::new("name", "VARCHAR(100)"))
                    .with_column(ColumnInfo::new("created_at", "TIMESTAMP")),
            )
            .with_table(
                TableInfo::new("orders")
                    .with_column(ColumnInfo::new("id", "INTEGER").primary_key().auto_increment())
                    .with_column(ColumnInfo::new("user_id", "INTEGER").not_null())
                    .with_column(ColumnInfo::new("total", "DECIMAL(10,2)"))
                    .with_column(ColumnInfo::new("status", "VARCHAR(20)")),
            )
            .with_table(
                TableInfo::new("products")
                    .with_column(ColumnInfo::new("id", "INTEGER").primary_key())
                    .with_column(ColumnInfo::new("name", "VARCHAR(100)").not_null())
                    .with_column(ColumnInfo::new("price", "DECIMAL(10,2)")),
            )
            .with_metadata("databaseProductName", "SQLite")
            .with_metadata("databaseProductVersion", "3.45.1");

        let users: Vec<Row> = (1..=12)
            .map(|i| {
                make_row(&[
                    ("id", json!(i)),
                    ("email", json!(format!("user{i}@example.com"))),
                    ("name", json!(format!("User {i}"))),
                    ("created_at", if i % 4 == 0 { json!(null) } else { json!("2024-01-15 10:30:00") }),
                ])
            })
            .collect();

        Self::new()
            .with_schema(schema)
            .with_generation(
                "all users",
                GeneratedQuery::new("SELECT * FROM users;", "Lists every user."),
            )
            .with_generation(
                "count orders",
                GeneratedQuery::new("SELECT COUNT(*) AS order_count FROM orders;", "Counts all orders."),
            )
            .with_generation(
                "orders per user",
                GeneratedQuery::new(
                    "SELECT u.email, COUNT(o.id) AS orders FROM users u LEFT JOIN orders o ON o.user_id = u.id GROUP BY u.email;",
                    "Counts orders for each user.",
                ),
            )
            .with_execution(
                "SELECT * FROM users;",
                ExecutionPayload::success(
                    &[
                        ("id", "INTEGER"),
                        ("email", "VARCHAR"),
                        ("name", "VARCHAR"),
                        ("created_at", "TIMESTAMP"),
                    ],
                    users,
                    7,
                ),
            )
            .with_execution(
                "SELECT COUNT(*) AS order_count FROM orders;",
                ExecutionPayload::success(
                    &[("order_count", "BIGINT")],
                    vec![make_row(&[("order_count", json!(42))])],
                    3,
                ),
            )
    }

    /// Sets the schema returned by `fetch_schema`.
    pub fn with_schema(mut self, schema: SchemaSnapshot) -> Self {
        self.schema = schema;
        self
    }

    /// Adds a canned generation.
    ///
    /// When the prompt contains `pattern` (case-insensitively) the mock
    /// returns `query`. Patterns are checked in insertion order.
    pub fn with_generation(mut self, pattern: impl Into<String>, query: GeneratedQuery) -> Self {
        self.generations.push((pattern.into().to_lowercase(), query));
        self
    }

    /// Adds a canned execution result for the given SQL.
    ///
    /// Matching ignores case, surrounding whitespace, runs of whitespace and
    /// a trailing semicolon.
    pub fn with_execution(mut self, sql: &str, payload: ExecutionPayload) -> Self {
        self.executions.push((normalize_sql(sql), payload));
        self
    }

    /// Adds a canned explanation for the given SQL, matched like executions.
    ///
    /// SQL without one falls back to the explanation of the canned
    /// generation that produced it.
    pub fn with_explanation(mut self, sql: &str, explanation: impl Into<String>) -> Self {
        self.explanations.push((normalize_sql(sql), explanation.into()));
        self
    }

    /// Fixes the connection id handed out by the probe.
    pub fn with_connection_id(mut self, id: impl Into<String>) -> Self {
        self.connection_id = Some(id.into());
        self
    }

    /// Holds every generate and execute call until a permit is released.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Lets `n` gated calls proceed.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Makes the next probes fail with `message`.
    pub fn fail_probe(&self, message: impl Into<String>) {
        lock(&self.failures).probe = Some(message.into());
    }

    /// Makes the next schema fetches fail with `message`.
    pub fn fail_schema(&self, message: impl Into<String>) {
        lock(&self.failures).schema = Some(message.into());
    }

    /// Makes the next generations fail with `message`.
    pub fn fail_generation(&self, message: impl Into<String>) {
        lock(&self.failures).generate = Some(message.into());
    }

    /// Makes the next executions fail with `message`.
    pub fn fail_execution(&self, message: impl Into<String>) {
        lock(&self.failures).execute = Some(message.into());
    }

    /// Makes the next validations and explanations fail with `message`.
    pub fn fail_review(&self, message: impl Into<String>) {
        lock(&self.failures).review = Some(message.into());
    }

    /// Clears every injected failure.
    pub fn clear_failures(&self) {
        *lock(&self.failures) = Failures::default();
    }

    /// Returns how many calls each operation has received.
    pub fn counts(&self) -> CallCounts {
        CallCounts {
            probe: self.counters.probe.load(Ordering::SeqCst),
            schema: self.counters.schema.load(Ordering::SeqCst),
            generate: self.counters.generate.load(Ordering::SeqCst),
            execute: self.counters.execute.load(Ordering::SeqCst),
            validate: self.counters.validate.load(Ordering::SeqCst),
            explain: self.counters.explain.load(Ordering::SeqCst),
        }
    }

    /// Generation requests received so far, oldest first.
    pub fn generation_requests(&self) -> Vec<GenerationRequest> {
        lock(&self.recorded).generations.clone()
    }

    /// Execution requests received so far, oldest first.
    pub fn execution_requests(&self) -> Vec<ExecutionRequest> {
        lock(&self.recorded).executions.clone()
    }

    /// Id the probe returns for `params`.
    ///
    /// Stable for the same kind, host, port and database.
    pub fn connection_id_for(&self, params: &ConnectionParams) -> String {
        if let Some(id) = &self.connection_id {
            return id.clone();
        }
        let mut hasher = DefaultHasher::new();
        (params.kind, &params.host, params.port, &params.database).hash(&mut hasher);
        format!("{:x}", hasher.finish())
    }

    async fn pass_gate(&self) -> Result<()> {
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|_| AssistantError::internal("Mock gate closed"))?
                .forget();
        }
        Ok(())
    }

    fn find_generation(&self, prompt: &str) -> Option<&GeneratedQuery> {
        let prompt = prompt.to_lowercase();
        self.generations
            .iter()
            .find(|(pattern, _)| prompt.contains(pattern.as_str()))
            .map(|(_, query)| query)
    }

    fn find_explanation(&self, sql: &str) -> Option<String> {
        let key = normalize_sql(sql);
        self.explanations
            .iter()
            .find(|(sql, _)| *sql == key)
            .map(|(_, text)| text.clone())
            .or_else(|| {
                self.generations
                    .iter()
                    .map(|(_, query)| query)
                    .find(|query| normalize_sql(&query.generated_sql) == key)
                    .and_then(|query| query.explanation.clone())
            })
    }

    fn find_execution(&self, sql: &str) -> Option<&ExecutionPayload> {
        let sql = normalize_sql(sql);
        self.executions
            .iter()
            .find(|(key, _)| *key == sql)
            .map(|(_, payload)| payload)
    }
}

#[async_trait]
impl AssistantService for MockService {
    async fn test_connection(&self, params: &ConnectionParams) -> Result<ProbeResponse> {
        self.counters.probe.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = lock(&self.failures).probe.clone() {
            return Err(AssistantError::connection(message));
        }
        Ok(ProbeResponse {
            connection_id: self.connection_id_for(params),
            status: STATUS_SUCCESS.to_string(),
            message: Some("Connection established successfully".to_string()),
        })
    }

    async fn fetch_schema(
        &self,
        _params: &ConnectionParams,
        connection_id: &SessionId,
    ) -> Result<SchemaResponse> {
        self.counters.schema.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = lock(&self.failures).schema.clone() {
            return Err(AssistantError::schema(message));
        }
        Ok(SchemaResponse {
            connection_id: connection_id.to_string(),
            schema: self.schema.clone(),
            status: STATUS_SUCCESS.to_string(),
        })
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        self.counters.generate.fetch_add(1, Ordering::SeqCst);
        lock(&self.recorded).generations.push(request.clone());
        self.pass_gate().await?;

        if let Some(message) = lock(&self.failures).generate.clone() {
            return Err(AssistantError::generation(message));
        }

        match self.find_generation(&request.natural_language_query) {
            Some(query) => Ok(GenerationResponse {
                query: query.clone(),
                status: STATUS_SUCCESS.to_string(),
            }),
            None => {
                debug!("Mock has no generation for '{}'", request.natural_language_query);
                Ok(GenerationResponse {
                    query: GeneratedQuery {
                        warnings: vec!["Could not map the question to the schema".to_string()],
                        ..GeneratedQuery::default()
                    },
                    status: "ERROR".to_string(),
                })
            }
        }
    }

    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResponse> {
        self.counters.execute.fetch_add(1, Ordering::SeqCst);
        lock(&self.recorded).executions.push(request.clone());
        self.pass_gate().await?;

        if let Some(message) = lock(&self.failures).execute.clone() {
            return Err(AssistantError::execution(message));
        }

        let execution = match self.find_execution(&request.sql) {
            Some(payload) => {
                let mut payload = payload.clone();
                if let Some(limit) = request.limit {
                    payload.results.truncate(limit as usize);
                }
                payload
            }
            None => ExecutionPayload::error(
                "ERROR",
                format!("No result for query: {}", request.sql.trim()),
            ),
        };
        let status = execution.status.clone();
        Ok(ExecutionResponse { execution, status })
    }

    async fn validate(&self, request: &ValidationRequest) -> Result<ValidationResponse> {
        self.counters.validate.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = lock(&self.failures).review.clone() {
            return Err(AssistantError::review(message));
        }
        if request.sql.trim().is_empty() {
            return Err(AssistantError::review("SQL query is required"));
        }
        Ok(ValidationResponse {
            validation: check_statement(&request.sql),
            status: STATUS_SUCCESS.to_string(),
        })
    }

    async fn explain(&self, request: &ExplainRequest) -> Result<ExplanationResponse> {
        self.counters.explain.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = lock(&self.failures).review.clone() {
            return Err(AssistantError::review(message));
        }
        if request.sql.trim().is_empty() {
            return Err(AssistantError::review("SQL query is required"));
        }
        Ok(match self.find_explanation(&request.sql) {
            Some(explanation) => ExplanationResponse {
                explanation,
                status: STATUS_SUCCESS.to_string(),
                message: None,
            },
            None => ExplanationResponse {
                explanation: String::new(),
                status: "ERROR".to_string(),
                message: Some("Failed to generate explanation".to_string()),
            },
        })
    }
}

/// Keyword checks: only a single read-only statement passes. Performance
/// hints are attached as suggestions.
fn check_statement(sql: &str) -> QueryValidation {
    let cleaned = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    let upper = cleaned.to_uppercase();
    let first = upper.split_whitespace().next().unwrap_or_default();

    let mut errors = Vec::new();
    let mut suggestions = Vec::new();

    match first {
        "SELECT" | "WITH" => {}
        "INSERT" | "UPDATE" | "DELETE" => errors.push(
            "Data modification queries (INSERT/UPDATE/DELETE) are not allowed in this context"
                .to_string(),
        ),
        "DROP" | "TRUNCATE" => {
            errors.push("Destructive operations (DROP/TRUNCATE) are strictly forbidden".to_string())
        }
        other => errors.push(format!("Statement type {other} is not allowed")),
    }
    if upper.trim_end_matches(';').contains(';') {
        errors.push("Multiple statements in a single query are not allowed".to_string());
    }

    if upper.contains("SELECT *") {
        suggestions.push(
            "Consider specifying column names instead of using SELECT * for better performance"
                .to_string(),
        );
    }
    if !upper.contains("WHERE") && !upper.contains("LIMIT") {
        suggestions.push(
            "Consider adding a WHERE clause or LIMIT to avoid scanning entire tables".to_string(),
        );
    }

    let is_valid = errors.is_empty();
    let sanitized_query = is_valid.then(|| {
        let trimmed = cleaned.trim_end_matches(';');
        format!("{trimmed};")
    });
    QueryValidation {
        is_valid,
        errors,
        warnings: Vec::new(),
        suggestions,
        sanitized_query,
    }
}

fn normalize_sql(sql: &str) -> String {
    sql.trim()
        .trim_end_matches(';')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn make_row(cells: &[(&str, serde_json::Value)]) -> Row {
    cells
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

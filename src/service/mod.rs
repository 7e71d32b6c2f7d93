//! Collaborator interface for the assistant service.
//!
//! The service owns everything the client does not: connecting to the
//! database, introspecting it, turning natural language into SQL and running
//! queries. This module defines the request/response shapes and the trait the
//! controllers call; `http` talks to a real backend and `mock` is an
//! in-memory stand-in for tests and headless runs.

mod http;
mod mock;

pub use http::{HttpService, HttpServiceConfig, DEFAULT_BASE_URL};
pub use mock::{CallCounts, MockService};

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::connection::{ConnectionParams, SessionId};
use crate::error::Result;
use crate::query::Row;
use crate::schema::SchemaSnapshot;

/// Status string the service uses for successful responses.
pub const STATUS_SUCCESS: &str = "SUCCESS";

/// Returns true if a service status string means success.
pub fn is_success(status: &str) -> bool {
    status.eq_ignore_ascii_case(STATUS_SUCCESS)
}

/// Reads `null` as the field type's default.
///
/// The backend sends `null` for strings and lists it could not fill, such
/// as the catalog name of a SQLite database.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Response to a connectivity probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResponse {
    pub connection_id: String,
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response to a schema fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub connection_id: String,
    pub schema: SchemaSnapshot,
    pub status: String,
}

/// Request to turn a natural-language question into SQL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub natural_language_query: String,
    pub connection_id: SessionId,
    #[serde(rename = "connectionDto")]
    pub params: ConnectionParams,
    /// Extra context for the generator, e.g. the formatted schema.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub context: serde_json::Map<String, serde_json::Value>,
}

/// SQL produced by the generation service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratedQuery {
    #[serde(deserialize_with = "null_as_default")]
    pub generated_sql: String,
    pub explanation: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub warnings: Vec<String>,
    #[serde(alias = "executable")]
    pub is_executable: bool,
    pub metadata: Option<QueryMetadata>,
}

impl GeneratedQuery {
    /// Creates an executable query with an explanation.
    pub fn new(sql: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            generated_sql: sql.into(),
            explanation: Some(explanation.into()),
            is_executable: true,
            ..Self::default()
        }
    }
}

/// Response to a generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub query: GeneratedQuery,
    pub status: String,
}

/// Request to run SQL against the session's database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    pub sql: String,
    pub connection_id: SessionId,
    #[serde(rename = "connectionDto")]
    pub params: ConnectionParams,
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    pub dry_run: bool,
}

/// Execution result exactly as the service reports it.
///
/// `row_count` is the service's own count and can exceed `results.len()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutionPayload {
    #[serde(deserialize_with = "null_as_default")]
    pub results: Vec<Row>,
    #[serde(deserialize_with = "null_as_default")]
    pub column_names: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub column_types: Vec<String>,
    pub row_count: u64,
    pub execution_time_ms: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    pub error: Option<String>,
    pub metadata: Option<QueryMetadata>,
}

impl ExecutionPayload {
    /// Builds a successful payload whose row count matches its rows.
    pub fn success(columns: &[(&str, &str)], results: Vec<Row>, execution_time_ms: u64) -> Self {
        Self {
            row_count: results.len() as u64,
            results,
            column_names: columns.iter().map(|(name, _)| name.to_string()).collect(),
            column_types: columns.iter().map(|(_, ty)| ty.to_string()).collect(),
            execution_time_ms,
            status: STATUS_SUCCESS.to_string(),
            ..Self::default()
        }
    }

    /// Builds an error payload.
    pub fn error(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Overrides the reported row count.
    pub fn with_row_count(mut self, row_count: u64) -> Self {
        self.row_count = row_count;
        self
    }
}

/// Response to an execution request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResponse {
    pub execution: ExecutionPayload,
    pub status: String,
}

/// Static analysis the service attaches to generated and executed queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryMetadata {
    #[serde(deserialize_with = "null_as_default")]
    pub query_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tables_involved: Vec<String>,
    pub has_joins: bool,
    pub has_subqueries: bool,
    pub has_aggregations: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub complexity: String,
    /// Left untyped: backends emit either ISO strings or date arrays.
    pub timestamp: Option<serde_json::Value>,
}

/// Request to check SQL without running it. Needs no session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRequest {
    pub sql: String,
}

/// Static checks the service ran on a statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryValidation {
    #[serde(alias = "valid")]
    pub is_valid: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub errors: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub warnings: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub suggestions: Vec<String>,
    /// Normalized form of the statement, only present when it is valid.
    pub sanitized_query: Option<String>,
}

/// Response to a validation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub validation: QueryValidation,
    pub status: String,
}

/// Request to explain SQL in plain language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainRequest {
    pub sql: String,
    pub connection_id: SessionId,
    #[serde(rename = "connectionDto")]
    pub params: ConnectionParams,
}

/// Response to an explain request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub explanation: String,
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// The collaborator capabilities the client consumes.
///
/// Every call after the probe carries both the connection id and the full
/// connection parameters, except validation, which is sessionless.
#[async_trait]
pub trait AssistantService: Send + Sync {
    /// Probes connectivity and returns the id for a new session.
    async fn test_connection(&self, params: &ConnectionParams) -> Result<ProbeResponse>;

    /// Introspects the schema for a session.
    async fn fetch_schema(
        &self,
        params: &ConnectionParams,
        connection_id: &SessionId,
    ) -> Result<SchemaResponse>;

    /// Generates SQL for a natural-language question.
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse>;

    /// Runs SQL against the session's database.
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResponse>;

    /// Checks SQL for syntax and safety problems without running it.
    async fn validate(&self, request: &ValidationRequest) -> Result<ValidationResponse>;

    /// Describes what SQL does, using the session's schema as context.
    async fn explain(&self, request: &ExplainRequest) -> Result<ExplanationResponse>;
}

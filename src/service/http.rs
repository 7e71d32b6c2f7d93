//! HTTP client for the assistant backend.
//!
//! Talks JSON over reqwest to the REST endpoints under the configured base
//! URL. Requests are not retried; a failed call is reported once.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::{
    AssistantService, ExecutionRequest, ExecutionResponse, ExplainRequest, ExplanationResponse,
    GenerationRequest, GenerationResponse, ProbeResponse, SchemaResponse, ValidationRequest,
    ValidationResponse,
};
use crate::connection::{ConnectionParams, SessionId};
use crate::error::{AssistantError, Result};

/// Default base URL of the backend API.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpServiceConfig {
    /// Base URL, e.g. `http://localhost:8080/api`.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Sent as a bearer token when present.
    pub auth_token: Option<String>,
}

impl Default for HttpServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            auth_token: None,
        }
    }
}

impl HttpServiceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the bearer token.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

/// The kind of call, used to pick the error variant for failures.
#[derive(Debug, Clone, Copy)]
enum Operation {
    Probe,
    Schema,
    Generate,
    Execute,
    Validate,
    Explain,
}

impl Operation {
    fn path(self) -> &'static str {
        match self {
            Self::Probe => "database/test-connection",
            Self::Schema => "database/schema",
            Self::Generate => "query/generate",
            Self::Execute => "query/execute",
            Self::Validate => "query/validate",
            Self::Explain => "query/explain",
        }
    }

    fn error(self, message: String) -> AssistantError {
        match self {
            Self::Probe => AssistantError::connection(message),
            Self::Schema => AssistantError::schema(message),
            Self::Generate => AssistantError::generation(message),
            Self::Execute => AssistantError::execution(message),
            Self::Validate | Self::Explain => AssistantError::review(message),
        }
    }
}

/// Error body the backend returns on 4xx/5xx.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Assistant service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpService {
    base_url: Url,
    auth_token: Option<String>,
    client: Client,
}

impl HttpService {
    /// Creates a client with the given configuration.
    pub fn new(config: HttpServiceConfig) -> Result<Self> {
        // A trailing slash makes `Url::join` append instead of replacing the
        // last path segment.
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| {
            AssistantError::config(format!("Invalid service URL '{}': {}", config.base_url, e))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AssistantError::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            auth_token: config.auth_token.filter(|t| !t.trim().is_empty()),
            client,
        })
    }

    /// Returns the full URL for an operation.
    fn endpoint(&self, operation: Operation, connection_id: Option<&SessionId>) -> Result<Url> {
        let mut url = self.base_url.join(operation.path()).map_err(|e| {
            AssistantError::config(format!("Invalid endpoint '{}': {}", operation.path(), e))
        })?;
        if let Some(id) = connection_id {
            url.query_pairs_mut().append_pair("connectionId", id.as_str());
        }
        Ok(url)
    }

    async fn post<B, R>(
        &self,
        operation: Operation,
        connection_id: Option<&SessionId>,
        body: &B,
    ) -> Result<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = self.endpoint(operation, connection_id)?;
        debug!("POST {}", url);

        let mut request = self.client.post(url).json(body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AssistantError::transport("Request timed out. Try again.")
            } else if e.is_connect() {
                AssistantError::transport(
                    "Failed to connect to the assistant service. Is it running?",
                )
            } else {
                AssistantError::transport(format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AssistantError::transport(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            let error = Self::parse_error(operation, status, &text);
            warn!("{} failed with {}: {}", operation.path(), status, error);
            return Err(error);
        }

        serde_json::from_str(&text).map_err(|e| {
            AssistantError::transport(format!("Failed to parse response: {}", e))
        })
    }

    /// Turns a non-2xx response into an error, preferring the body's
    /// `message` field.
    fn parse_error(operation: Operation, status: StatusCode, body: &str) -> AssistantError {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return AssistantError::transport("Authentication failed. Check your auth token.");
        }

        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    format!("Request failed with status {}", status)
                } else {
                    format!("Request failed with status {}: {}", status, body.trim())
                }
            });

        operation.error(message)
    }
}

#[async_trait]
impl AssistantService for HttpService {
    async fn test_connection(&self, params: &ConnectionParams) -> Result<ProbeResponse> {
        self.post(Operation::Probe, None, params).await
    }

    async fn fetch_schema(
        &self,
        params: &ConnectionParams,
        connection_id: &SessionId,
    ) -> Result<SchemaResponse> {
        self.post(Operation::Schema, Some(connection_id), params)
            .await
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        self.post(Operation::Generate, Some(&request.connection_id), request)
            .await
    }

    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResponse> {
        self.post(Operation::Execute, Some(&request.connection_id), request)
            .await
    }

    async fn validate(&self, request: &ValidationRequest) -> Result<ValidationResponse> {
        self.post(Operation::Validate, None, request).await
    }

    async fn explain(&self, request: &ExplainRequest) -> Result<ExplanationResponse> {
        self.post(Operation::Explain, Some(&request.connection_id), request)
            .await
    }
}

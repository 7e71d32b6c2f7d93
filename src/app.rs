//! Core orchestrator for the SQL assistant.
//!
//! Owns the optional workspace and implements every action the UI can take:
//! connect, reset, prompt, edit, execute and schema search. Nothing outside
//! the connection form is reachable until a connectivity probe succeeds.

use std::sync::Arc;
use tracing::{info, warn};

use crate::connection::{ConnectionParams, ConnectionSession, SessionId};
use crate::dispatch::Dispatch;
use crate::error::{AssistantError, Result};
use crate::query::{DraftReview, ExecutionOutcome, ResultSet};
use crate::schema::{SchemaSnapshot, TableInfo};
use crate::service::{is_success, AssistantService, GeneratedQuery, QueryValidation};
use crate::workspace::Workspace;

/// Message for actions that need a session.
const NOT_CONNECTED: &str = "Not connected to a database";

/// Top-level state: either the connection form or a mounted workspace.
pub struct Assistant {
    service: Arc<dyn AssistantService>,
    workspace: Option<Workspace>,
    last_connection_error: Option<String>,
}

impl Assistant {
    /// Creates a disconnected assistant.
    pub fn new(service: Arc<dyn AssistantService>) -> Self {
        Self {
            service,
            workspace: None,
            last_connection_error: None,
        }
    }

    /// Probes `params` and, on success, mounts a fresh workspace.
    ///
    /// Any previous workspace is torn down first. Blank databases are
    /// rejected without a probe. The schema is fetched right after mounting;
    /// a schema failure is kept on the index and does not fail the connect.
    pub async fn connect(&mut self, params: ConnectionParams) -> Result<SessionId> {
        if let Err(e) = params.validate() {
            self.last_connection_error = Some(e.message().to_string());
            return Err(e);
        }
        let params = params.normalized();

        let probe = self.service.test_connection(&params).await.and_then(|probe| {
            if is_success(&probe.status) && !probe.connection_id.trim().is_empty() {
                Ok(probe)
            } else {
                Err(AssistantError::connection(
                    probe
                        .message
                        .unwrap_or_else(|| format!("Connection probe returned status {}", probe.status)),
                ))
            }
        });

        let probe = match probe {
            Ok(probe) => probe,
            Err(e) => {
                warn!("Connection to {} failed: {}", params.display_string(), e);
                self.last_connection_error = Some(e.message().to_string());
                return Err(AssistantError::connection(e.message()));
            }
        };

        self.reset();
        let session = ConnectionSession::new(SessionId::new(probe.connection_id), params);
        let id = session.id().clone();
        info!("{}", session.banner());
        self.last_connection_error = None;

        let workspace = Workspace::mount(Arc::clone(&self.service), session);
        let schema = workspace.schema().clone();
        self.workspace = Some(workspace);

        if let Err(e) = schema.load().await {
            warn!("Schema unavailable after connect: {}", e);
        }
        Ok(id)
    }

    /// Drops the workspace and returns to the connection form.
    pub fn reset(&mut self) {
        if let Some(workspace) = self.workspace.take() {
            info!("Disconnected from {}", workspace.session().params().display_string());
        }
    }

    pub fn is_connected(&self) -> bool {
        self.workspace.is_some()
    }

    pub fn session(&self) -> Option<&ConnectionSession> {
        self.workspace.as_ref().map(Workspace::session)
    }

    pub fn workspace(&self) -> Option<&Workspace> {
        self.workspace.as_ref()
    }

    /// Message from the last failed connect, cleared on success.
    pub fn last_connection_error(&self) -> Option<&str> {
        self.last_connection_error.as_deref()
    }

    fn mounted(&self) -> Result<&Workspace> {
        self.workspace
            .as_ref()
            .ok_or_else(|| AssistantError::connection(NOT_CONNECTED))
    }

    /// Generates SQL for `prompt`.
    pub async fn submit_prompt(&self, prompt: &str) -> Result<Dispatch<GeneratedQuery>> {
        self.mounted()?.generation().generate(prompt).await
    }

    /// Sets the prompt input text without sending it.
    pub fn set_prompt(&self, text: &str) -> Result<()> {
        self.mounted()?.generation().set_prompt(text);
        Ok(())
    }

    /// Generates SQL from the prompt input text.
    pub async fn submit(&self) -> Result<Dispatch<GeneratedQuery>> {
        self.mounted()?.generation().submit().await
    }

    /// Overwrites the draft with user-typed SQL.
    pub fn edit_sql(&self, sql: &str) -> Result<()> {
        self.mounted()?.draft().edit(sql);
        Ok(())
    }

    /// Executes the current draft.
    pub async fn execute(&self) -> Result<Dispatch<ResultSet>> {
        self.mounted()?.execution().execute().await
    }

    /// Validates the current draft without running it.
    pub async fn validate_draft(&self) -> Result<Dispatch<QueryValidation>> {
        self.mounted()?.review().validate().await
    }

    /// Explains the current draft.
    pub async fn explain_draft(&self) -> Result<Dispatch<String>> {
        self.mounted()?.review().explain().await
    }

    /// Last review of the draft, if connected and any has finished.
    pub fn review(&self) -> Option<DraftReview> {
        self.workspace.as_ref().and_then(Workspace::last_review)
    }

    /// Sets the schema search text and returns the matching tables.
    pub fn search_schema(&self, term: &str) -> Result<Vec<TableInfo>> {
        let schema = self.mounted()?.schema();
        schema.set_search(term);
        Ok(schema.visible_tables())
    }

    /// Retries the schema fetch. A no-op if it is already loaded.
    pub async fn reload_schema(&self) -> Result<Dispatch<Arc<SchemaSnapshot>>> {
        self.mounted()?.schema().load().await
    }

    /// Last execution outcome, if connected and anything has run.
    pub fn outcome(&self) -> Option<ExecutionOutcome> {
        self.workspace.as_ref().and_then(Workspace::outcome)
    }

    /// Current draft text, empty when disconnected.
    pub fn draft_text(&self) -> String {
        self.workspace
            .as_ref()
            .map(|w| w.draft().text())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for Assistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("workspace", &self.workspace)
            .field("last_connection_error", &self.last_connection_error)
            .finish()
    }
}

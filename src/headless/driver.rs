//! Applies parsed events to an [`Assistant`].
//!
//! Shared by the headless runner and the interactive prompt so both speak
//! the same event language.

use std::sync::Arc;
use tracing::debug;

use super::events::Event;
use crate::app::Assistant;
use crate::config::Config;
use crate::connection::ConnectionParams;
use crate::dispatch::Dispatch;
use crate::error::{AssistantError, Result};
use crate::render;
use crate::service::AssistantService;

/// Snapshot of assistant state for assertions and JSON output.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct HeadlessState {
    pub connected: bool,
    pub connection_id: Option<String>,
    /// Conversation entries, including the welcome message.
    pub message_count: usize,
    pub draft: String,
    /// Unsent prompt input.
    pub prompt: String,
    /// `none`, `success` or `failure`.
    pub outcome: String,
    /// `none`, `loading`, `ready` or `failed`.
    pub schema: String,
    /// `none`, `valid`, `invalid`, `explained` or `failure`.
    pub review: String,
    pub visible_tables: Vec<String>,
}

impl HeadlessState {
    pub fn from_assistant(assistant: &Assistant) -> Self {
        let Some(workspace) = assistant.workspace() else {
            return Self {
                outcome: "none".to_string(),
                schema: "none".to_string(),
                review: "none".to_string(),
                ..Self::default()
            };
        };

        Self {
            connected: true,
            connection_id: Some(workspace.session().id().to_string()),
            message_count: workspace.conversation().len(),
            draft: workspace.draft().text(),
            prompt: workspace.generation().prompt(),
            outcome: workspace
                .outcome()
                .map_or("none", |outcome| outcome.label())
                .to_string(),
            schema: workspace.schema().state().label().to_string(),
            review: workspace
                .last_review()
                .map_or("none", |review| review.label())
                .to_string(),
            visible_tables: workspace
                .schema()
                .visible_tables()
                .into_iter()
                .map(|table| table.name)
                .collect(),
        }
    }

    /// Looks up a field by name as a string. `visible_tables` is comma-joined.
    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "connected" => Some(self.connected.to_string()),
            "connection_id" => Some(self.connection_id.clone().unwrap_or_default()),
            "message_count" => Some(self.message_count.to_string()),
            "draft" => Some(self.draft.clone()),
            "prompt" => Some(self.prompt.clone()),
            "outcome" => Some(self.outcome.clone()),
            "schema" => Some(self.schema.clone()),
            "review" => Some(self.review.clone()),
            "visible_tables" => Some(self.visible_tables.join(",")),
            "table_count" => Some(self.visible_tables.len().to_string()),
            _ => None,
        }
    }
}

/// Drives an [`Assistant`] one event at a time.
pub struct EventDriver {
    assistant: Assistant,
    defaults: Option<ConnectionParams>,
    config: Config,
    status: Option<String>,
}

impl EventDriver {
    pub fn new(service: Arc<dyn AssistantService>) -> Self {
        Self {
            assistant: Assistant::new(service),
            defaults: None,
            config: Config::default(),
            status: None,
        }
    }

    /// Parameters used by a bare `connect` event.
    pub fn with_defaults(mut self, params: ConnectionParams) -> Self {
        self.defaults = Some(params);
        self
    }

    /// Config whose named connections `connect:<name>` resolves against.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn assistant(&self) -> &Assistant {
        &self.assistant
    }

    /// Outcome of the last event, shown under the panels.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Renders every panel plus the status line.
    pub fn screen(&self) -> String {
        let mut screen = render::render_screen(&self.assistant);
        if let Some(status) = &self.status {
            screen.push_str(&format!("\n== Status ==\n{status}\n"));
        }
        screen
    }

    pub fn state(&self) -> HeadlessState {
        HeadlessState::from_assistant(&self.assistant)
    }

    /// Applies one event. Returns the verdict for assertions, `None` otherwise.
    pub async fn apply(&mut self, event: &Event) -> Option<bool> {
        debug!("Applying event: {}", event);

        match event {
            Event::Connect(name) => {
                let status = match self.resolve(name.as_deref()) {
                    Ok(params) => match self.assistant.connect(params).await {
                        Ok(id) => format!("connect: connected ({id})"),
                        Err(e) => e.to_string(),
                    },
                    Err(e) => e.to_string(),
                };
                self.status = Some(status);
            }
            Event::Prompt(text) => {
                let result = match self.assistant.set_prompt(text) {
                    Ok(()) => self.assistant.submit().await,
                    Err(e) => Err(e),
                };
                self.report("prompt", result);
            }
            Event::Edit(sql) => {
                self.status = Some(match self.assistant.edit_sql(sql) {
                    Ok(()) => "edit: draft updated".to_string(),
                    Err(e) => e.to_string(),
                });
            }
            Event::Execute => {
                let result = self.assistant.execute().await;
                self.report("execute", result);
            }
            Event::Validate => {
                let result = self.assistant.validate_draft().await;
                self.report("validate", result);
            }
            Event::Explain => {
                let result = self.assistant.explain_draft().await;
                self.report("explain", result);
            }
            Event::Search(term) => {
                self.status = Some(match self.assistant.search_schema(term) {
                    Ok(tables) => format!("search: {} tables", tables.len()),
                    Err(e) => e.to_string(),
                });
            }
            Event::ReloadSchema => {
                let result = self.assistant.reload_schema().await;
                self.report("reload-schema", result);
            }
            Event::Reset => {
                self.assistant.reset();
                self.status = Some("reset: disconnected".to_string());
            }
            Event::Wait(duration) => tokio::time::sleep(*duration).await,
            Event::Snapshot(_) => {}
            Event::Assert(assertion) => {
                return Some(assertion.check(&self.screen(), &self.state()));
            }
        }
        None
    }

    fn resolve(&self, name: Option<&str>) -> Result<ConnectionParams> {
        match name {
            Some(name) => self.config.connection_params(name),
            None => self.defaults.clone().ok_or_else(|| {
                AssistantError::config(
                    "No connection configured. Pass connection flags or use connect:<name>",
                )
            }),
        }
    }

    fn report<T>(&mut self, action: &str, result: Result<Dispatch<T>>) {
        self.status = Some(match result {
            Ok(dispatch) => format!("{action}: {}", dispatch.label()),
            Err(e) => e.to_string(),
        });
    }
}

impl std::fmt::Debug for EventDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDriver")
            .field("assistant", &self.assistant)
            .field("status", &self.status)
            .finish()
    }
}

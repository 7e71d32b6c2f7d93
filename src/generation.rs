//! Natural-language to SQL generation.
//!
//! A successful generation records the exchange in the conversation and
//! seeds the draft; a failed one adds a single system notice and leaves the
//! draft alone.

use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::connection::ConnectionSession;
use crate::conversation::{ConversationLog, NewEntry};
use crate::dispatch::{lock, Dispatch, InFlightSlot};
use crate::draft::QueryDraft;
use crate::error::{AssistantError, Result};
use crate::schema::SchemaIndex;
use crate::service::{is_success, AssistantService, GeneratedQuery, GenerationRequest};

/// Assistant text used when the service sends no explanation.
pub const DEFAULT_EXPLANATION: &str = "Here's the SQL query I generated:";

/// System notice appended when generation fails.
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate SQL query. Please try again.";

/// Drives one generation at a time.
#[derive(Clone)]
pub struct GenerationController {
    service: Arc<dyn AssistantService>,
    session: Arc<ConnectionSession>,
    log: ConversationLog,
    draft: QueryDraft,
    schema: SchemaIndex,
    lifetime: CancellationToken,
    slot: InFlightSlot,
    prompt: Arc<Mutex<String>>,
}

impl GenerationController {
    pub fn new(
        service: Arc<dyn AssistantService>,
        session: Arc<ConnectionSession>,
        log: ConversationLog,
        draft: QueryDraft,
        schema: SchemaIndex,
        lifetime: CancellationToken,
    ) -> Self {
        Self {
            service,
            session,
            log,
            draft,
            schema,
            lifetime,
            slot: InFlightSlot::new(),
            prompt: Arc::new(Mutex::new(String::new())),
        }
    }

    /// Sets the prompt input text.
    pub fn set_prompt(&self, text: impl Into<String>) {
        *lock(&self.prompt) = text.into();
    }

    /// Current prompt input text.
    pub fn prompt(&self) -> String {
        lock(&self.prompt).clone()
    }

    /// Generates from the prompt input. The input is cleared on success.
    pub async fn submit(&self) -> Result<Dispatch<GeneratedQuery>> {
        let prompt = self.prompt();
        self.generate(&prompt).await
    }

    /// Generates SQL for `prompt`.
    ///
    /// Blank prompts send nothing. On success exactly two entries (user,
    /// assistant) are appended together and the draft is replaced. On
    /// failure one system entry is appended and the error is returned.
    pub async fn generate(&self, prompt: &str) -> Result<Dispatch<GeneratedQuery>> {
        if prompt.trim().is_empty() {
            return Ok(Dispatch::Blank);
        }
        let Some(_guard) = self.slot.try_acquire() else {
            debug!("Generation already in flight; ignoring prompt");
            return Ok(Dispatch::Busy);
        };

        let mut context = serde_json::Map::new();
        if let Some(schema) = self.schema.format_for_prompt() {
            context.insert("schema".to_string(), serde_json::Value::String(schema));
        }
        let request = GenerationRequest {
            natural_language_query: prompt.to_string(),
            connection_id: self.session.id().clone(),
            params: self.session.params().clone(),
            context,
        };
        debug!("Generating SQL for: {}", prompt);

        let result = tokio::select! {
            biased;
            _ = self.lifetime.cancelled() => None,
            result = self.service.generate(&request) => Some(result),
        };
        let Some(result) = result else {
            debug!("Session closed during generation; discarding result");
            return Ok(Dispatch::Discarded);
        };

        let result = result.and_then(|response| {
            if is_success(&response.status) {
                Ok(response.query)
            } else {
                Err(AssistantError::generation(format!(
                    "Generation returned status {}",
                    response.status
                )))
            }
        });

        match result {
            Ok(query) => {
                if !query.warnings.is_empty() {
                    debug!("Generation warnings: {:?}", query.warnings);
                }
                debug!("Generated SQL (executable: {}): {}", query.is_executable, query.generated_sql);

                let explanation = query
                    .explanation
                    .as_deref()
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or(DEFAULT_EXPLANATION);
                self.log.append_exchange(
                    NewEntry::user(prompt),
                    NewEntry::assistant(explanation, query.generated_sql.clone()),
                );
                self.draft.replace(query.generated_sql.clone());
                lock(&self.prompt).clear();
                Ok(Dispatch::Completed(query))
            }
            Err(e) => {
                warn!("SQL generation failed: {}", e);
                self.log.append(NewEntry::system(GENERATION_FAILED_MESSAGE));
                Err(AssistantError::generation(e.message()))
            }
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.slot.is_busy()
    }
}

impl std::fmt::Debug for GenerationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationController")
            .field("session", &self.session.id())
            .field("in_flight", &self.is_in_flight())
            .finish()
    }
}

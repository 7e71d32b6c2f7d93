//! Session-scoped schema cache with search.

use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{SchemaSnapshot, TableInfo};
use crate::connection::ConnectionSession;
use crate::dispatch::{lock, Dispatch, InFlightSlot};
use crate::error::{AssistantError, Result};
use crate::service::{is_success, AssistantService};

/// Load state of the schema.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaState {
    /// Fetch not finished yet (or never started).
    Loading,
    Ready(Arc<SchemaSnapshot>),
    /// Fetch failed; no partial schema is kept.
    Failed(String),
}

impl SchemaState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Ready(_) => "ready",
            Self::Failed(_) => "failed",
        }
    }
}

#[derive(Debug)]
struct IndexState {
    state: SchemaState,
    search: String,
}

/// Fetches the schema once per session and answers filtered lookups.
///
/// Clones share the same cache and search term.
#[derive(Clone)]
pub struct SchemaIndex {
    service: Arc<dyn AssistantService>,
    session: Arc<ConnectionSession>,
    lifetime: CancellationToken,
    slot: InFlightSlot,
    inner: Arc<Mutex<IndexState>>,
}

impl SchemaIndex {
    pub fn new(
        service: Arc<dyn AssistantService>,
        session: Arc<ConnectionSession>,
        lifetime: CancellationToken,
    ) -> Self {
        Self {
            service,
            session,
            lifetime,
            slot: InFlightSlot::new(),
            inner: Arc::new(Mutex::new(IndexState {
                state: SchemaState::Loading,
                search: String::new(),
            })),
        }
    }

    /// Fetches the schema unless it is already cached.
    ///
    /// Once `Ready` this returns the cached snapshot without a request.
    /// After a failure it may be called again; nothing retries on its own.
    pub async fn load(&self) -> Result<Dispatch<Arc<SchemaSnapshot>>> {
        if let Some(snapshot) = self.snapshot() {
            return Ok(Dispatch::Completed(snapshot));
        }

        let Some(_guard) = self.slot.try_acquire() else {
            debug!("Schema fetch already in flight");
            return Ok(Dispatch::Busy);
        };
        lock(&self.inner).state = SchemaState::Loading;

        debug!("Fetching schema for connection {}", self.session.id());
        let result = tokio::select! {
            biased;
            _ = self.lifetime.cancelled() => None,
            result = self.service.fetch_schema(self.session.params(), self.session.id()) => Some(result),
        };
        let Some(result) = result else {
            debug!("Session closed during schema fetch; discarding");
            return Ok(Dispatch::Discarded);
        };

        let result = result.and_then(|response| {
            if is_success(&response.status) {
                Ok(response.schema)
            } else {
                Err(AssistantError::schema(format!(
                    "Schema fetch returned status {}",
                    response.status
                )))
            }
        });

        match result {
            Ok(schema) => {
                info!(
                    "Loaded schema '{}' with {} tables",
                    schema.database_name,
                    schema.tables.len()
                );
                let snapshot = Arc::new(schema);
                lock(&self.inner).state = SchemaState::Ready(Arc::clone(&snapshot));
                Ok(Dispatch::Completed(snapshot))
            }
            Err(e) => {
                warn!("Schema fetch failed: {}", e);
                lock(&self.inner).state = SchemaState::Failed(e.message().to_string());
                Err(AssistantError::schema(e.message()))
            }
        }
    }

    pub fn state(&self) -> SchemaState {
        lock(&self.inner).state.clone()
    }

    /// Returns the cached snapshot, if loaded.
    pub fn snapshot(&self) -> Option<Arc<SchemaSnapshot>> {
        match &lock(&self.inner).state {
            SchemaState::Ready(snapshot) => Some(Arc::clone(snapshot)),
            _ => None,
        }
    }

    /// Returns the failure message, if the last fetch failed.
    pub fn error(&self) -> Option<String> {
        match &lock(&self.inner).state {
            SchemaState::Failed(message) => Some(message.clone()),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(lock(&self.inner).state, SchemaState::Loading)
    }

    /// Tables matching `term`, in snapshot order. Empty until loaded.
    pub fn filter(&self, term: &str) -> Vec<TableInfo> {
        self.snapshot()
            .map(|snapshot| snapshot.filter(term).into_iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Sets the search box text.
    pub fn set_search(&self, term: impl Into<String>) {
        lock(&self.inner).search = term.into();
    }

    pub fn search(&self) -> String {
        lock(&self.inner).search.clone()
    }

    /// Tables matching the current search text.
    pub fn visible_tables(&self) -> Vec<TableInfo> {
        let term = self.search();
        self.filter(&term)
    }

    /// Schema as generation context, if loaded.
    pub fn format_for_prompt(&self) -> Option<String> {
        self.snapshot().map(|snapshot| snapshot.format_for_prompt())
    }
}

impl std::fmt::Debug for SchemaIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaIndex")
            .field("session", &self.session.id())
            .field("state", &self.state().label())
            .finish()
    }
}

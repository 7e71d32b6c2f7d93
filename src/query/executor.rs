//! Runs the current draft against the session's database.
//!
//! The controller keeps the last outcome for the results panel. It does not
//! validate SQL; the service decides what is allowed.

use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::view::EXECUTION_LIMIT;
use super::{ExecutionOutcome, ResultSet};
use crate::connection::ConnectionSession;
use crate::dispatch::{lock, Dispatch, InFlightSlot};
use crate::draft::QueryDraft;
use crate::error::{AssistantError, Result};
use crate::service::{AssistantService, ExecutionRequest};

/// Drives one execution at a time and owns the last outcome.
#[derive(Clone)]
pub struct ExecutionController {
    service: Arc<dyn AssistantService>,
    session: Arc<ConnectionSession>,
    draft: QueryDraft,
    lifetime: CancellationToken,
    slot: InFlightSlot,
    outcome: Arc<Mutex<Option<ExecutionOutcome>>>,
}

impl ExecutionController {
    pub fn new(
        service: Arc<dyn AssistantService>,
        session: Arc<ConnectionSession>,
        draft: QueryDraft,
        lifetime: CancellationToken,
    ) -> Self {
        Self {
            service,
            session,
            draft,
            lifetime,
            slot: InFlightSlot::new(),
            outcome: Arc::new(Mutex::new(None)),
        }
    }

    /// Executes the draft as it reads right now.
    ///
    /// Later edits or generations do not change the SQL that was sent. On
    /// failure the outcome becomes `Failure` and the error is returned.
    pub async fn execute(&self) -> Result<Dispatch<ResultSet>> {
        let sql = self.draft.text();
        if sql.trim().is_empty() {
            return Ok(Dispatch::Blank);
        }
        let Some(_guard) = self.slot.try_acquire() else {
            debug!("Execution already in flight; ignoring trigger");
            return Ok(Dispatch::Busy);
        };

        let request = ExecutionRequest {
            sql,
            connection_id: self.session.id().clone(),
            params: self.session.params().clone(),
            limit: Some(EXECUTION_LIMIT),
            offset: None,
            dry_run: false,
        };
        debug!("Executing query: {}", request.sql);

        let result = tokio::select! {
            biased;
            _ = self.lifetime.cancelled() => None,
            result = self.service.execute(&request) => Some(result),
        };
        let Some(result) = result else {
            debug!("Session closed during execution; discarding result");
            return Ok(Dispatch::Discarded);
        };

        let outcome = match result {
            Ok(response) => ExecutionOutcome::from(response.execution),
            Err(e) => ExecutionOutcome::failure(e.message()),
        };
        *lock(&self.outcome) = Some(outcome.clone());

        match outcome {
            ExecutionOutcome::Success(set) => {
                debug!(
                    "Query returned {} rows ({} reported) in {}ms",
                    set.rows.len(),
                    set.row_count,
                    set.elapsed_ms
                );
                Ok(Dispatch::Completed(set))
            }
            ExecutionOutcome::Failure { message } => {
                warn!("Query execution failed: {}", message);
                Err(AssistantError::execution(message))
            }
        }
    }

    /// The last stored outcome, if any execution has finished.
    pub fn outcome(&self) -> Option<ExecutionOutcome> {
        lock(&self.outcome).clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.slot.is_busy()
    }

    /// Whether the execute button is enabled.
    pub fn can_execute(&self) -> bool {
        !self.is_in_flight() && !self.draft.is_blank()
    }
}

impl std::fmt::Debug for ExecutionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionController")
            .field("session", &self.session.id())
            .field("in_flight", &self.is_in_flight())
            .finish()
    }
}

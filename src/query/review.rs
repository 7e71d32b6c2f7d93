//! Validates or explains the current draft without running it.
//!
//! Both actions share one in-flight slot and one stored result, shown in
//! the review panel until the next review replaces it.

use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::connection::ConnectionSession;
use crate::dispatch::{lock, Dispatch, InFlightSlot};
use crate::draft::QueryDraft;
use crate::error::{AssistantError, Result};
use crate::service::{
    is_success, AssistantService, ExplainRequest, QueryValidation, ValidationRequest,
};

/// Shown when an explanation comes back without a usable message.
pub const EXPLANATION_FAILED_FALLBACK: &str = "Failed to generate explanation";

/// The last finished review of the draft.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftReview {
    Validation(QueryValidation),
    Explanation(String),
    Failure { message: String },
}

impl DraftReview {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Validation(v) if v.is_valid => "valid",
            Self::Validation(_) => "invalid",
            Self::Explanation(_) => "explained",
            Self::Failure { .. } => "failure",
        }
    }
}

/// Drives one review at a time and owns the last result.
#[derive(Clone)]
pub struct ReviewController {
    service: Arc<dyn AssistantService>,
    session: Arc<ConnectionSession>,
    draft: QueryDraft,
    lifetime: CancellationToken,
    slot: InFlightSlot,
    review: Arc<Mutex<Option<DraftReview>>>,
}

impl ReviewController {
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
            review: Arc::new(Mutex::new(None)),
        }
    }

    /// Checks the draft for syntax and safety problems.
    ///
    /// An invalid statement is still a completed review; only a failed call
    /// is an error.
    pub async fn validate(&self) -> Result<Dispatch<QueryValidation>> {
        let service = Arc::clone(&self.service);
        self.run(|sql| async move {
            let response = service.validate(&ValidationRequest { sql }).await?;
            if !is_success(&response.status) {
                return Err(AssistantError::review(format!(
                    "Validation returned status {}",
                    response.status
                )));
            }
            Ok(response.validation)
        })
        .await
    }

    /// Asks the service to describe what the draft does.
    pub async fn explain(&self) -> Result<Dispatch<String>> {
        let service = Arc::clone(&self.service);
        let request = |sql| ExplainRequest {
            sql,
            connection_id: self.session.id().clone(),
            params: self.session.params().clone(),
        };
        self.run(|sql| {
            let request = request(sql);
            async move {
                let response = service.explain(&request).await?;
                if is_success(&response.status) && !response.explanation.trim().is_empty() {
                    Ok(response.explanation)
                } else {
                    Err(AssistantError::review(
                        response
                            .message
                            .filter(|m| !m.trim().is_empty())
                            .unwrap_or_else(|| EXPLANATION_FAILED_FALLBACK.to_string()),
                    ))
                }
            }
        })
        .await
    }

    async fn run<T, F, Fut>(&self, call: F) -> Result<Dispatch<T>>
    where
        T: Clone + Into<DraftReview>,
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let sql = self.draft.text();
        if sql.trim().is_empty() {
            return Ok(Dispatch::Blank);
        }
        let Some(_guard) = self.slot.try_acquire() else {
            debug!("Review already in flight; ignoring trigger");
            return Ok(Dispatch::Busy);
        };

        let result = tokio::select! {
            biased;
            _ = self.lifetime.cancelled() => None,
            result = call(sql) => Some(result),
        };
        let Some(result) = result else {
            debug!("Session closed during review; discarding result");
            return Ok(Dispatch::Discarded);
        };

        match result {
            Ok(value) => {
                *lock(&self.review) = Some(value.clone().into());
                Ok(Dispatch::Completed(value))
            }
            Err(e) => {
                warn!("Review failed: {}", e);
                *lock(&self.review) = Some(DraftReview::Failure {
                    message: e.message().to_string(),
                });
                Err(AssistantError::review(e.message()))
            }
        }
    }

    /// The last stored review, if any has finished.
    pub fn review(&self) -> Option<DraftReview> {
        lock(&self.review).clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.slot.is_busy()
    }
}

impl From<QueryValidation> for DraftReview {
    fn from(validation: QueryValidation) -> Self {
        Self::Validation(validation)
    }
}

impl From<String> for DraftReview {
    fn from(explanation: String) -> Self {
        Self::Explanation(explanation)
    }
}

impl std::fmt::Debug for ReviewController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewController")
            .field("session", &self.session.id())
            .field("in_flight", &self.is_in_flight())
            .finish()
    }
}

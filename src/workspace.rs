//! Everything that lives for exactly one connection session.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::connection::ConnectionSession;
use crate::conversation::ConversationLog;
use crate::draft::QueryDraft;
use crate::generation::GenerationController;
use crate::query::{DraftReview, ExecutionController, ExecutionOutcome, ReviewController};
use crate::schema::SchemaIndex;
use crate::service::AssistantService;

/// The controllers mounted for one session.
///
/// Built fresh on connect and dropped on reset. Dropping cancels the
/// session's lifetime token, so requests still in flight discard their
/// results instead of touching a newer session's state.
pub struct Workspace {
    session: Arc<ConnectionSession>,
    lifetime: CancellationToken,
    conversation: ConversationLog,
    draft: QueryDraft,
    schema: SchemaIndex,
    generation: GenerationController,
    execution: ExecutionController,
    review: ReviewController,
}

impl Workspace {
    /// Mounts a workspace for `session`. No request is made here.
    pub fn mount(service: Arc<dyn AssistantService>, session: ConnectionSession) -> Self {
        let session = Arc::new(session);
        let lifetime = CancellationToken::new();
        let conversation = ConversationLog::with_welcome();
        let draft = QueryDraft::new();
        let schema = SchemaIndex::new(Arc::clone(&service), Arc::clone(&session), lifetime.clone());
        let generation = GenerationController::new(
            Arc::clone(&service),
            Arc::clone(&session),
            conversation.clone(),
            draft.clone(),
            schema.clone(),
            lifetime.clone(),
        );
        let execution = ExecutionController::new(
            Arc::clone(&service),
            Arc::clone(&session),
            draft.clone(),
            lifetime.clone(),
        );
        let review = ReviewController::new(
            service,
            Arc::clone(&session),
            draft.clone(),
            lifetime.clone(),
        );
        debug!("Mounted workspace for connection {}", session.id());

        Self {
            session,
            lifetime,
            conversation,
            draft,
            schema,
            generation,
            execution,
            review,
        }
    }

    pub fn session(&self) -> &ConnectionSession {
        &self.session
    }

    pub fn conversation(&self) -> &ConversationLog {
        &self.conversation
    }

    pub fn draft(&self) -> &QueryDraft {
        &self.draft
    }

    pub fn schema(&self) -> &SchemaIndex {
        &self.schema
    }

    pub fn generation(&self) -> &GenerationController {
        &self.generation
    }

    pub fn execution(&self) -> &ExecutionController {
        &self.execution
    }

    pub fn review(&self) -> &ReviewController {
        &self.review
    }

    /// Last validation or explanation of the draft.
    pub fn last_review(&self) -> Option<DraftReview> {
        self.review.review()
    }

    /// Shortcut for the last execution outcome.
    pub fn outcome(&self) -> Option<ExecutionOutcome> {
        self.execution.outcome()
    }

    /// A token that is cancelled when this workspace is dropped.
    pub fn lifetime(&self) -> CancellationToken {
        self.lifetime.clone()
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        debug!("Tearing down workspace for connection {}", self.session.id());
        self.lifetime.cancel();
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("session", &self.session.id())
            .field("entries", &self.conversation.len())
            .finish()
    }
}

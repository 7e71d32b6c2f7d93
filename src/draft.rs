//! The editable SQL draft.

use std::sync::{Arc, Mutex};

use crate::dispatch::lock;

/// Single cell holding the current SQL text.
///
/// Written by generation (`replace`) and by the user (`edit`); the last
/// write wins and no history is kept. Clones share the same cell.
#[derive(Debug, Clone, Default)]
pub struct QueryDraft {
    text: Arc<Mutex<String>>,
}

impl QueryDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the draft with generated SQL.
    pub fn replace(&self, sql: impl Into<String>) {
        *lock(&self.text) = sql.into();
    }

    /// Overwrites the draft with user-typed SQL.
    pub fn edit(&self, sql: impl Into<String>) {
        *lock(&self.text) = sql.into();
    }

    /// Returns a copy of the current text.
    pub fn text(&self) -> String {
        lock(&self.text).clone()
    }

    /// True when the draft is empty after trimming.
    pub fn is_blank(&self) -> bool {
        lock(&self.text).trim().is_empty()
    }
}

//! Append-only chat history for one session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::dispatch::lock;

/// System entry every new log starts with.
pub const WELCOME_MESSAGE: &str =
    "Connected to database! Ask me anything in natural language and I'll generate SQL queries for you.";

/// Who wrote an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Returns the role as a string for display purposes.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }

    /// Panel label for the role.
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "Assistant",
            Self::System => "System",
        }
    }
}

/// Entry id, unique within one log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(u64);

impl EntryId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One message in the conversation. Never mutated after append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationEntry {
    pub id: EntryId,
    pub role: Role,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Content of an entry before it is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub role: Role,
    pub text: String,
    pub sql: Option<String>,
}

impl NewEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            sql: None,
        }
    }

    pub fn assistant(text: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            sql: Some(sql.into()),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            text: text.into(),
            sql: None,
        }
    }
}

#[derive(Debug, Default)]
struct LogState {
    entries: Vec<ConversationEntry>,
    next_id: u64,
}

impl LogState {
    fn push(&mut self, entry: NewEntry) -> EntryId {
        self.next_id += 1;
        let id = EntryId(self.next_id);
        self.entries.push(ConversationEntry {
            id,
            role: entry.role,
            text: entry.text,
            sql: entry.sql,
            created_at: Utc::now(),
        });
        id
    }
}

/// Ordered conversation log. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    state: Arc<Mutex<LogState>>,
}

impl ConversationLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a log holding the welcome entry.
    pub fn with_welcome() -> Self {
        let log = Self::new();
        log.append(NewEntry::system(WELCOME_MESSAGE));
        log
    }

    /// Appends one entry and returns its id.
    pub fn append(&self, entry: NewEntry) -> EntryId {
        lock(&self.state).push(entry)
    }

    /// Appends a user entry and its assistant reply with nothing in between.
    pub fn append_exchange(&self, user: NewEntry, assistant: NewEntry) -> (EntryId, EntryId) {
        let mut state = lock(&self.state);
        let user_id = state.push(user);
        let assistant_id = state.push(assistant);
        (user_id, assistant_id)
    }

    /// Returns a copy of every entry in insertion order.
    pub fn entries(&self) -> Vec<ConversationEntry> {
        lock(&self.state).entries.clone()
    }

    pub fn last(&self) -> Option<ConversationEntry> {
        lock(&self.state).entries.last().cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

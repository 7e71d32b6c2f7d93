//! Error types for the SQL assistant.
//!
//! Defines the main error enum used throughout the client. Every variant is
//! terminal at the UI boundary: nothing is retried automatically.

use thiserror::Error;

/// Main error type for assistant operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssistantError {
    /// Connectivity probe failed (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Schema introspection failed; no partial schema is kept.
    #[error("Schema error: {0}")]
    SchemaFetch(String),

    /// The generation service could not produce SQL.
    #[error("Generation error: {0}")]
    Generation(String),

    /// Query execution failed (syntax errors, validation, driver errors, etc.)
    #[error("Execution error: {0}")]
    Execution(String),

    /// Explaining or validating the draft failed.
    #[error("Review error: {0}")]
    Review(String),

    /// Configuration errors (invalid config file, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP transport errors talking to the assistant service.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AssistantError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a schema fetch error with the given message.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::SchemaFetch(msg.into())
    }

    /// Creates a generation error with the given message.
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    /// Creates an execution error with the given message.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Creates a review error with the given message.
    pub fn review(msg: impl Into<String>) -> Self {
        Self::Review(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a transport error with the given message.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::SchemaFetch(_) => "Schema Error",
            Self::Generation(_) => "Generation Error",
            Self::Execution(_) => "Execution Error",
            Self::Review(_) => "Review Error",
            Self::Config(_) => "Configuration Error",
            Self::Transport(_) => "Transport Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns the bare message without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Connection(m)
            | Self::SchemaFetch(m)
            | Self::Generation(m)
            | Self::Execution(m)
            | Self::Review(m)
            | Self::Config(m)
            | Self::Transport(m)
            | Self::Internal(m) => m,
        }
    }
}

/// Result type alias using AssistantError.
pub type Result<T> = std::result::Result<T, AssistantError>;

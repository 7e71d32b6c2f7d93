//! The identity of one active connection.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ConnectionParams;

/// Opaque connection id handed out by the connectivity probe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Binds a connection id to the parameters it was probed with.
///
/// Immutable once created. Resetting the connection builds a new session
/// rather than editing this one, so `id` and `params` never diverge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSession {
    id: SessionId,
    params: ConnectionParams,
}

impl ConnectionSession {
    pub fn new(id: SessionId, params: ConnectionParams) -> Self {
        Self { id, params }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Banner text shown while connected.
    pub fn banner(&self) -> String {
        format!("Connected to {} (ID: {})", self.params.display_string(), self.id)
    }
}

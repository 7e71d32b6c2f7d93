//! Connection parameters as declared on the connection form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AssistantError, Result};

/// Supported database kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DatabaseKind {
    #[default]
    MySql,
    PostgreSql,
    Sqlite,
    H2,
}

impl DatabaseKind {
    /// All kinds, in the order the connection form lists them.
    pub const ALL: [DatabaseKind; 4] = [Self::MySql, Self::PostgreSql, Self::Sqlite, Self::H2];

    /// Returns the wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MySql => "MYSQL",
            Self::PostgreSql => "POSTGRESQL",
            Self::Sqlite => "SQLITE",
            Self::H2 => "H2",
        }
    }

    /// Whether host and port mean anything for this kind.
    pub fn uses_network(&self) -> bool {
        matches!(self, Self::MySql | Self::PostgreSql)
    }

    /// Returns the default port for network kinds.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::MySql => Some(3306),
            Self::PostgreSql => Some(5432),
            Self::Sqlite | Self::H2 => None,
        }
    }

    fn url_prefix(&self) -> &'static str {
        match self {
            Self::MySql => "jdbc:mysql://",
            Self::PostgreSql => "jdbc:postgresql://",
            Self::Sqlite => "jdbc:sqlite:",
            Self::H2 => "jdbc:h2:",
        }
    }
}

impl FromStr for DatabaseKind {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mysql" => Ok(Self::MySql),
            "postgres" | "postgresql" | "pg" => Ok(Self::PostgreSql),
            "sqlite" => Ok(Self::Sqlite),
            "h2" => Ok(Self::H2),
            _ => Err(AssistantError::config(format!(
                "Unknown database kind: '{s}'. Expected mysql, postgresql, sqlite or h2"
            ))),
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters describing how to reach a database.
///
/// Serialized in the camelCase shape the assistant service expects, with
/// `type` for the kind and `connectionString` for the override.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionParams {
    #[serde(rename = "type", alias = "kind")]
    pub kind: DatabaseKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Database name, or file path for SQLite.
    pub database: String,

    #[serde(default, skip_serializing_if = "Option::is_none", alias = "user")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(
        rename = "connectionString",
        alias = "connection_string",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub connection_string_override: Option<String>,
}

impl ConnectionParams {
    /// Creates parameters for the given kind and database.
    pub fn new(kind: DatabaseKind, database: impl Into<String>) -> Self {
        Self {
            kind,
            database: database.into(),
            ..Self::default()
        }
    }

    /// Sets host and port.
    pub fn with_host(mut self, host: impl Into<String>, port: Option<u16>) -> Self {
        self.host = Some(host.into());
        self.port = port;
        self
    }

    /// Sets the credentials.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: Option<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = password;
        self
    }

    /// Sets a connection string that takes precedence over the other fields.
    pub fn with_connection_string(mut self, conn_str: impl Into<String>) -> Self {
        self.connection_string_override = Some(conn_str.into());
        self
    }

    /// Checks the invariants that must hold before a probe is issued.
    pub fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(AssistantError::config("Database name is required"));
        }
        if self.kind.uses_network() && self.port == Some(0) {
            return Err(AssistantError::config("Port must be between 1 and 65535"));
        }
        Ok(())
    }

    /// Returns a copy with the database trimmed and host/port dropped for
    /// file-based kinds.
    pub fn normalized(&self) -> Self {
        let mut params = self.clone();
        params.database = params.database.trim().to_string();
        if !params.kind.uses_network() {
            params.host = None;
            params.port = None;
        }
        params.connection_string_override = params
            .connection_string_override
            .filter(|s| !s.trim().is_empty());
        params
    }

    /// Port actually used: the declared one or the kind's default.
    pub fn effective_port(&self) -> Option<u16> {
        if !self.kind.uses_network() {
            return None;
        }
        self.port.or_else(|| self.kind.default_port())
    }

    /// Builds the JDBC-style URL the service connects with.
    pub fn connection_url(&self) -> String {
        if let Some(conn_str) = self
            .connection_string_override
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        {
            return conn_str.to_string();
        }

        let prefix = self.kind.url_prefix();
        match self.effective_port() {
            Some(port) => {
                let host = self.host.as_deref().unwrap_or("localhost");
                format!("{prefix}{host}:{port}/{}", self.database)
            }
            None => format!("{prefix}{}", self.database),
        }
    }

    /// Returns a display-safe string (no password) for the connection banner.
    pub fn display_string(&self) -> String {
        format!("{} database: {}", self.kind, self.database)
    }
}

//! Configuration management for the SQL assistant.
//!
//! Handles loading configuration from TOML files and environment variables,
//! with support for named database connections and the service endpoint.

use crate::connection::{ConnectionParams, DatabaseKind};
use crate::error::{AssistantError, Result};
use crate::service::{HttpServiceConfig, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable overriding the service base URL.
pub const ENV_API_URL: &str = "SQL_ASSISTANT_API_URL";

/// Environment variable holding the service bearer token.
pub const ENV_TOKEN: &str = "SQL_ASSISTANT_TOKEN";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Assistant service endpoint.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Named database connections.
    #[serde(default)]
    pub connections: HashMap<String, ConnectionConfig>,
}

/// Where the assistant service lives and how to authenticate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Bearer token (prefer the environment variable over storing it here).
    #[serde(default)]
    pub auth_token: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            auth_token: None,
        }
    }
}

impl ServiceConfig {
    /// Fills unset values from `SQL_ASSISTANT_API_URL` and
    /// `SQL_ASSISTANT_TOKEN`.
    pub fn apply_env_defaults(&mut self) {
        if self.base_url == DEFAULT_BASE_URL {
            if let Ok(url) = std::env::var(ENV_API_URL) {
                if !url.trim().is_empty() {
                    self.base_url = url;
                }
            }
        }
        if self.auth_token.is_none() {
            self.auth_token = std::env::var(ENV_TOKEN).ok().filter(|t| !t.trim().is_empty());
        }
    }

    /// Converts to the HTTP client configuration.
    pub fn to_http_config(&self) -> HttpServiceConfig {
        let config = HttpServiceConfig::new(self.base_url.clone()).with_timeout(self.timeout_secs);
        match &self.auth_token {
            Some(token) => config.with_auth_token(token.clone()),
            None => config,
        }
    }
}

/// Database connection as written in the config file or on the command line.
///
/// Every field is optional so partial sources can be merged before the
/// result is turned into `ConnectionParams`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConnectionConfig {
    /// `mysql`, `postgresql`, `sqlite` or `h2`.
    #[serde(rename = "type", alias = "kind", default)]
    pub kind: Option<String>,

    pub host: Option<String>,

    pub port: Option<u16>,

    /// Database name, or file path for SQLite.
    pub database: Option<String>,

    pub user: Option<String>,

    /// Database password (not recommended to store in config).
    pub password: Option<String>,

    /// JDBC URL passed to the service as-is.
    pub connection_string: Option<String>,
}

impl ConnectionConfig {
    /// Creates a connection config from a connection URL.
    ///
    /// Accepts `mysql://`, `postgres://`/`postgresql://`, `sqlite:<path>` and
    /// `h2:<name>`, each optionally prefixed with `jdbc:`. A `jdbc:` URL is
    /// also kept verbatim as the connection string.
    pub fn from_connection_string(conn_str: &str) -> Result<Self> {
        let trimmed = conn_str.trim();
        let is_jdbc = trimmed
            .get(..5)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("jdbc:"));
        let without_jdbc = if is_jdbc { &trimmed[5..] } else { trimmed };

        let (scheme, rest) = without_jdbc.split_once(':').ok_or_else(|| {
            AssistantError::config(format!("Invalid connection string: '{conn_str}'"))
        })?;
        let kind: DatabaseKind = scheme.parse().map_err(|_| {
            AssistantError::config(format!(
                "Invalid scheme '{scheme}'. Expected mysql, postgresql, sqlite or h2"
            ))
        })?;

        let mut config = Self {
            kind: Some(kind.as_str().to_lowercase()),
            connection_string: is_jdbc.then(|| trimmed.to_string()),
            ..Self::default()
        };

        if kind.uses_network() {
            let url = Url::parse(without_jdbc)
                .map_err(|e| AssistantError::config(format!("Invalid connection string: {e}")))?;
            config.host = url.host_str().map(String::from);
            config.port = url.port();
            config.database = url
                .path()
                .strip_prefix('/')
                .filter(|db| !db.is_empty())
                .map(String::from);
            config.user = Some(url.username().to_string()).filter(|u| !u.is_empty());
            config.password = url.password().map(String::from);
        } else {
            let path = rest.strip_prefix("//").unwrap_or(rest);
            config.database = Some(path.to_string()).filter(|p| !p.is_empty());
        }

        Ok(config)
    }

    /// Merges another config into this one, with the other taking precedence.
    pub fn merge(&mut self, other: &ConnectionConfig) {
        if other.kind.is_some() {
            self.kind = other.kind.clone();
        }
        if other.host.is_some() {
            self.host = other.host.clone();
        }
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.database.is_some() {
            self.database = other.database.clone();
        }
        if other.user.is_some() {
            self.user = other.user.clone();
        }
        if other.password.is_some() {
            self.password = other.password.clone();
        }
        if other.connection_string.is_some() {
            self.connection_string = other.connection_string.clone();
        }
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Builds connection parameters. The kind defaults to MySQL.
    pub fn to_params(&self) -> Result<ConnectionParams> {
        let kind = match &self.kind {
            Some(kind) => kind.parse()?,
            None => DatabaseKind::default(),
        };
        let database = self
            .database
            .as_deref()
            .ok_or_else(|| AssistantError::config("Database name is required"))?;

        let mut params = ConnectionParams::new(kind, database);
        params.host = self.host.clone();
        params.port = self.port;
        params.username = self.user.clone();
        params.password = self.password.clone();
        params.connection_string_override = self.connection_string.clone();
        params.validate()?;
        Ok(params)
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sql-assistant")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AssistantError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            AssistantError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Gets a named connection, or the default connection if name is None.
    pub fn get_connection(&self, name: Option<&str>) -> Option<&ConnectionConfig> {
        let key = name.unwrap_or("default");
        self.connections.get(key)
    }

    /// Looks up a named connection and converts it to parameters.
    pub fn connection_params(&self, name: &str) -> Result<ConnectionParams> {
        self.get_connection(Some(name))
            .ok_or_else(|| {
                AssistantError::config(format!("Connection '{name}' not found in config file"))
            })?
            .to_params()
    }
}

//! sql-assistant: natural language to SQL against a remote assistant service.

use anyhow::Context;
use sql_assistant::cli::Cli;
use sql_assistant::config::{Config, ConnectionConfig};
use sql_assistant::connection::ConnectionParams;
use sql_assistant::error::{AssistantError, Result};
use sql_assistant::headless::{self, EventDriver};
use sql_assistant::service::{AssistantService, HttpService, MockService};
use sql_assistant::{logging, repl};
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse_args();

    if cli.is_headless() {
        logging::init_stderr_logging();
    } else {
        logging::init_file_logging();
    }

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    if let Some(url) = &cli.api_url {
        config.service.base_url = url.clone();
    }
    if let Some(token) = &cli.token {
        config.service.auth_token = Some(token.clone());
    }
    config.service.apply_env_defaults();

    let service: Arc<dyn AssistantService> = if cli.mock {
        info!("Using the built-in demo service");
        Arc::new(MockService::demo())
    } else {
        info!("Using assistant service at {}", config.service.base_url);
        Arc::new(HttpService::new(config.service.to_http_config())?)
    };

    let mut driver = EventDriver::new(service);
    match resolve_connection(&cli, &config)? {
        Some(params) => {
            info!("Default connection: {}", params.display_string());
            driver = driver.with_defaults(params);
        }
        None => warn!("No default database connection configured"),
    }
    let driver = driver.with_config(config);

    if cli.is_headless() {
        Ok(headless::run_headless(&cli, driver).await?)
    } else {
        println!("Logging to {}", logging::get_log_path().display());
        repl::run_interactive(driver).await?;
        Ok(0)
    }
}

/// Resolves the default connection with precedence:
/// 1. CLI arguments (highest), layered over the named connection if any
/// 2. Named connection from config
/// 3. Default connection from config
fn resolve_connection(cli: &Cli, config: &Config) -> Result<Option<ConnectionParams>> {
    let mut connection: Option<ConnectionConfig> = match cli.connection_name() {
        Some(name) => Some(config.get_connection(Some(name)).cloned().ok_or_else(|| {
            AssistantError::config(format!("Connection '{name}' not found in config file"))
        })?),
        None => None,
    };

    if let Some(overrides) = cli.to_connection_config()? {
        connection
            .get_or_insert_with(ConnectionConfig::default)
            .merge(&overrides);
    }

    if connection.is_none() {
        connection = config.get_connection(None).cloned();
    }

    connection.map(|c| c.to_params()).transpose()
}

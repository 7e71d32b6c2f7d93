//! Headless mode for scripted runs and automation.
//!
//! Executes a list of events against the assistant and captures the
//! rendered screen for verification.

mod driver;
mod events;
mod output;

pub use driver::{EventDriver, HeadlessState};
pub use events::{Assertion, Event, EventParser};
pub use output::HeadlessOutput;

use crate::cli::{Cli, OutputFormat};
use crate::error::{AssistantError, Result};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Configuration for headless mode execution.
#[derive(Debug, Clone, Default)]
pub struct HeadlessConfig {
    pub output_format: OutputFormat,
    /// Whether to stop on first assertion failure.
    pub fail_fast: bool,
    /// Path to write output (None = stdout).
    pub output_file: Option<PathBuf>,
}

impl HeadlessConfig {
    /// Creates a HeadlessConfig from CLI arguments.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        Ok(Self {
            output_format: cli.parse_output_format().map_err(AssistantError::config)?,
            fail_fast: cli.fail_fast,
            output_file: cli.output_file.clone(),
        })
    }
}

/// Result of headless execution.
#[derive(Debug)]
pub struct HeadlessResult {
    /// Final screen content as text.
    pub screen: String,
    pub events_executed: usize,
    pub duration: Duration,
    pub assertions_passed: usize,
    pub assertions_failed: usize,
    /// The failing assertion events, as written.
    pub failures: Vec<String>,
    pub state: HeadlessState,
    /// Frame captures (frames output only).
    pub frames: Vec<Frame>,
}

impl HeadlessResult {
    /// Process exit code: 1 when any assertion failed.
    pub fn exit_code(&self) -> i32 {
        if self.assertions_failed > 0 {
            1
        } else {
            0
        }
    }
}

/// The screen after one event.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Frame number (0 = initial state).
    pub number: usize,
    /// Event that produced this frame (None for initial).
    pub event: Option<String>,
    pub screen: String,
}

/// Runs a scripted event list against an [`EventDriver`].
pub struct HeadlessRunner {
    config: HeadlessConfig,
    driver: EventDriver,
    events: Vec<Event>,
    frames: Vec<Frame>,
    assertions_passed: usize,
    assertions_failed: usize,
    failures: Vec<String>,
}

impl HeadlessRunner {
    pub fn new(config: HeadlessConfig, driver: EventDriver) -> Self {
        Self {
            config,
            driver,
            events: Vec::new(),
            frames: Vec::new(),
            assertions_passed: 0,
            assertions_failed: 0,
            failures: Vec::new(),
        }
    }

    /// Loads events given one per item (repeated `--event` flags).
    pub fn load_events(&mut self, events: &[String]) -> Result<()> {
        self.events = EventParser::new().parse_lines(events.iter().map(String::as_str))?;
        Ok(())
    }

    /// Loads events from a script file, or stdin for `-`.
    pub fn load_script(&mut self, path: &str) -> Result<()> {
        let content = if path == "-" {
            use std::io::Read;
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| AssistantError::internal(format!("Failed to read stdin: {e}")))?;
            buffer
        } else {
            std::fs::read_to_string(path).map_err(|e| {
                AssistantError::config(format!("Failed to read script file '{path}': {e}"))
            })?
        };

        self.events = EventParser::new().parse_all(&content)?;
        Ok(())
    }

    /// Runs every loaded event and returns the result.
    pub async fn run(mut self) -> HeadlessResult {
        let start_time = Instant::now();
        let capture = self.config.output_format == OutputFormat::Frames;
        if capture {
            self.capture_frame(None);
        }

        let events = std::mem::take(&mut self.events);
        let mut events_executed = 0;

        for event in events {
            let verdict = self.driver.apply(&event).await;
            events_executed += 1;

            if capture {
                self.capture_frame(Some(event.to_string()));
            }

            match verdict {
                Some(true) => self.assertions_passed += 1,
                Some(false) => {
                    warn!("Assertion failed: {}", event);
                    self.assertions_failed += 1;
                    self.failures.push(event.to_string());
                    if self.config.fail_fast {
                        break;
                    }
                }
                None => {}
            }
        }

        info!(
            "Headless run finished: {} events, {} assertions failed",
            events_executed, self.assertions_failed
        );

        HeadlessResult {
            screen: self.driver.screen(),
            events_executed,
            duration: start_time.elapsed(),
            assertions_passed: self.assertions_passed,
            assertions_failed: self.assertions_failed,
            failures: self.failures,
            state: self.driver.state(),
            frames: self.frames,
        }
    }

    fn capture_frame(&mut self, event: Option<String>) {
        let number = self.frames.len();
        self.frames.push(Frame {
            number,
            event,
            screen: self.driver.screen(),
        });
    }
}

/// Runs headless mode from CLI arguments. Returns the process exit code.
pub async fn run_headless(cli: &Cli, driver: EventDriver) -> Result<i32> {
    cli.validate_headless().map_err(AssistantError::config)?;

    let config = HeadlessConfig::from_cli(cli)?;
    let mut runner = HeadlessRunner::new(config.clone(), driver);

    if let Some(ref script_path) = cli.script {
        runner.load_script(script_path)?;
    } else {
        runner.load_events(&cli.events)?;
    }

    let result = runner.run().await;
    let output_str = HeadlessOutput::new(config.output_format).format(&result);

    if let Some(ref path) = config.output_file {
        std::fs::write(path, &output_str)
            .map_err(|e| AssistantError::internal(format!("Failed to write output file: {e}")))?;
    } else {
        print!("{}", output_str);
    }

    Ok(result.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{ConnectionParams, DatabaseKind};
    use crate::service::MockService;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn runner(format: OutputFormat, fail_fast: bool) -> HeadlessRunner {
        let driver = EventDriver::new(Arc::new(MockService::demo()))
            .with_defaults(ConnectionParams::new(DatabaseKind::Sqlite, "/tmp/t.db"));
        HeadlessRunner::new(
            HeadlessConfig {
                output_format: format,
                fail_fast,
                output_file: None,
            },
            driver,
        )
    }

    fn events(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_run_counts_assertions() {
        let mut runner = runner(OutputFormat::Text, false);
        runner
            .load_events(&events(&[
                "connect",
                "prompt:all users",
                "assert:state:draft=SELECT * FROM users;",
                "assert:contains:no such text",
                "execute",
                "assert:state:outcome=success",
            ]))
            .unwrap();

        let result = runner.run().await;
        assert_eq!(result.events_executed, 6);
        assert_eq!(result.assertions_passed, 2);
        assert_eq!(result.assertions_failed, 1);
        assert_eq!(result.failures, vec!["assert:contains:no such text"]);
        assert_eq!(result.exit_code(), 1);
        assert!(result.frames.is_empty());
    }

    #[tokio::test]
    async fn test_fail_fast_stops_at_first_failure() {
        let mut runner = runner(OutputFormat::Text, true);
        runner
            .load_events(&events(&["connect", "assert:state:connected=false", "execute"]))
            .unwrap();

        let result = runner.run().await;
        assert_eq!(result.events_executed, 2);
        assert_eq!(result.state.outcome, "none");
    }

    #[tokio::test]
    async fn test_frames_capture_each_event() {
        let mut runner = runner(OutputFormat::Frames, false);
        runner.load_events(&events(&["connect", "reset"])).unwrap();

        let result = runner.run().await;
        assert_eq!(result.frames.len(), 3);
        assert_eq!(result.frames[0].event, None);
        assert!(result.frames[0].screen.contains("Not connected"));
        assert_eq!(result.frames[1].event.as_deref(), Some("connect"));
        assert!(result.frames[1].screen.contains("Connected to SQLITE database"));
        assert_eq!(result.exit_code(), 0);
    }

    #[test]
    fn test_load_script_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.events");
        std::fs::write(&path, "# demo\nconnect\nsearch:ord\n").unwrap();

        let mut runner = runner(OutputFormat::Text, false);
        runner.load_script(path.to_str().unwrap()).unwrap();
        assert_eq!(runner.events.len(), 2);
    }

    #[test]
    fn test_load_script_missing_file() {
        let mut runner = runner(OutputFormat::Text, false);
        let err = runner.load_script("/nonexistent/demo.events").unwrap_err();
        assert_eq!(err.category(), "Configuration Error");
    }
}

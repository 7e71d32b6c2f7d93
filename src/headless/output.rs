//! Output formatting for headless mode: text, JSON, and frames.

use super::{HeadlessResult, HeadlessState};
use crate::cli::OutputFormat;
use serde::Serialize;

/// JSON output structure.
#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
    screen: &'a str,
    screen_lines: Vec<&'a str>,
    events_executed: usize,
    duration_ms: u64,
    assertions: AssertionSummary<'a>,
    state: &'a HeadlessState,
}

#[derive(Debug, Serialize)]
struct AssertionSummary<'a> {
    passed: usize,
    failed: usize,
    failures: &'a [String],
}

/// Formats headless execution results.
pub struct HeadlessOutput {
    format: OutputFormat,
}

impl HeadlessOutput {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the result according to the configured format.
    pub fn format(&self, result: &HeadlessResult) -> String {
        match self.format {
            OutputFormat::Text => self.format_text(result),
            OutputFormat::Json => self.format_json(result),
            OutputFormat::Frames => self.format_frames(result),
        }
    }

    fn format_text(&self, result: &HeadlessResult) -> String {
        let assertions = if result.assertions_passed > 0 || result.assertions_failed > 0 {
            format!(
                " | Assertions: {} passed, {} failed",
                result.assertions_passed, result.assertions_failed
            )
        } else {
            String::new()
        };

        format!(
            "{}\nEvents: {} executed in {}ms{}\n{}",
            result.screen,
            result.events_executed,
            result.duration.as_millis(),
            assertions,
            failure_lines(result)
        )
    }

    fn format_json(&self, result: &HeadlessResult) -> String {
        let json_output = JsonOutput {
            screen: &result.screen,
            screen_lines: result.screen.lines().collect(),
            events_executed: result.events_executed,
            duration_ms: result.duration.as_millis() as u64,
            assertions: AssertionSummary {
                passed: result.assertions_passed,
                failed: result.assertions_failed,
                failures: &result.failures,
            },
            state: &result.state,
        };

        serde_json::to_string_pretty(&json_output)
            .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize: {}\"}}", e))
    }

    fn format_frames(&self, result: &HeadlessResult) -> String {
        let frames_text: String = result
            .frames
            .iter()
            .map(|frame| {
                let event_desc = frame.event.as_deref().unwrap_or("initial");
                format!(
                    "=== FRAME {} ({}) ===\n{}\n",
                    frame.number, event_desc, frame.screen
                )
            })
            .collect();

        let assertions = if result.assertions_passed > 0 || result.assertions_failed > 0 {
            format!(
                "Assertions: {} passed, {} failed\n",
                result.assertions_passed, result.assertions_failed
            )
        } else {
            String::new()
        };

        format!(
            "{}Total: {} frames, {} events executed in {}ms\n{}{}",
            frames_text,
            result.frames.len(),
            result.events_executed,
            result.duration.as_millis(),
            assertions,
            failure_lines(result)
        )
    }
}

fn failure_lines(result: &HeadlessResult) -> String {
    result
        .failures
        .iter()
        .map(|event| format!("FAILED: {event}\n"))
        .collect()
}

//! Event DSL parser for headless mode.
//!
//! Parses lines like "connect", "prompt:all users", "assert:state:draft=..."
//! into executable events. One event per line; SQL may contain commas.

use super::HeadlessState;
use crate::error::{AssistantError, Result};
use std::fmt;
use std::time::Duration;

/// An assertion to check against the screen or state.
#[derive(Debug, Clone, PartialEq)]
pub enum Assertion {
    /// Screen contains text (case-insensitive).
    Contains(String),
    /// Screen contains text (case-sensitive).
    ContainsExact(String),
    /// Screen does not contain text.
    NotContains(String),
    /// Screen matches regex pattern.
    Matches(String),
    /// State field equals value.
    StateEquals { field: String, value: String },
    /// State field comparison (>=, <=, >, <).
    StateCompare {
        field: String,
        op: String,
        value: String,
    },
}

impl Assertion {
    /// Checks the assertion against the rendered screen and state.
    pub fn check(&self, screen: &str, state: &HeadlessState) -> bool {
        match self {
            Self::Contains(text) => screen.to_lowercase().contains(&text.to_lowercase()),
            Self::ContainsExact(text) => screen.contains(text),
            Self::NotContains(text) => !screen.to_lowercase().contains(&text.to_lowercase()),
            Self::Matches(pattern) => regex::Regex::new(pattern)
                .map(|re| re.is_match(screen))
                .unwrap_or(false),
            Self::StateEquals { field, value } => {
                state.field(field).as_deref() == Some(value.as_str())
            }
            Self::StateCompare { field, op, value } => {
                compare_values(state.field(field).as_deref(), op, value)
            }
        }
    }
}

/// Compares values using the given operator.
fn compare_values(actual: Option<&str>, op: &str, expected: &str) -> bool {
    let Some(actual) = actual else {
        return false;
    };

    if let (Ok(a), Ok(e)) = (actual.parse::<i64>(), expected.parse::<i64>()) {
        return match op {
            ">=" => a >= e,
            "<=" => a <= e,
            ">" => a > e,
            "<" => a < e,
            "=" | "==" => a == e,
            _ => false,
        };
    }

    matches!(op, "=" | "==") && actual == expected
}

/// A parsed event that can be executed.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Connect with the default parameters, or a named config connection.
    Connect(Option<String>),
    /// Send a natural-language prompt.
    Prompt(String),
    /// Overwrite the SQL draft.
    Edit(String),
    /// Execute the current draft.
    Execute,
    /// Check the current draft without running it.
    Validate,
    /// Explain the current draft in plain language.
    Explain,
    /// Set the schema search text (empty clears it).
    Search(String),
    /// Retry the schema fetch.
    ReloadSchema,
    /// Drop the session and return to the connection form.
    Reset,
    /// Wait for a duration.
    Wait(Duration),
    /// Take a named snapshot.
    Snapshot(String),
    /// Assert something about the screen or state.
    Assert(Assertion),
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect(None) => write!(f, "connect"),
            Self::Connect(Some(name)) => write!(f, "connect:{name}"),
            Self::Prompt(text) => write!(f, "prompt:{text}"),
            Self::Edit(sql) => write!(f, "edit:{sql}"),
            Self::Execute => write!(f, "execute"),
            Self::Validate => write!(f, "validate"),
            Self::Explain => write!(f, "explain"),
            Self::Search(term) => write!(f, "search:{term}"),
            Self::ReloadSchema => write!(f, "reload-schema"),
            Self::Reset => write!(f, "reset"),
            Self::Wait(d) => write!(f, "wait:{}ms", d.as_millis()),
            Self::Snapshot(name) => write!(f, "snapshot:{name}"),
            Self::Assert(a) => match a {
                Assertion::Contains(t) => write!(f, "assert:contains:{t}"),
                Assertion::ContainsExact(t) => write!(f, "assert:contains-exact:{t}"),
                Assertion::NotContains(t) => write!(f, "assert:not-contains:{t}"),
                Assertion::Matches(p) => write!(f, "assert:matches:{p}"),
                Assertion::StateEquals { field, value } => {
                    write!(f, "assert:state:{field}={value}")
                }
                Assertion::StateCompare { field, op, value } => {
                    write!(f, "assert:state:{field}{op}{value}")
                }
            },
        }
    }
}

/// Parser for the event DSL.
#[derive(Debug, Default)]
pub struct EventParser;

impl EventParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses all events from a script, one per line.
    pub fn parse_all(&self, input: &str) -> Result<Vec<Event>> {
        self.parse_lines(input.lines())
    }

    /// Parses events given individually, e.g. repeated `--event` flags.
    pub fn parse_lines<'a>(&self, lines: impl IntoIterator<Item = &'a str>) -> Result<Vec<Event>> {
        let mut events = Vec::new();

        for line in lines {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            events.push(self.parse_one(line)?);
        }

        Ok(events)
    }

    /// Parses a single event string.
    pub fn parse_one(&self, input: &str) -> Result<Event> {
        let input = input.trim();

        let (event_type, value) = match input.split_once(':') {
            Some((t, v)) => (t.trim().to_lowercase(), Some(v.trim())),
            None => (input.to_lowercase(), None),
        };

        match (event_type.as_str(), value) {
            ("connect", None) => Ok(Event::Connect(None)),
            ("connect", Some(name)) if name.is_empty() => Ok(Event::Connect(None)),
            ("connect", Some(name)) => Ok(Event::Connect(Some(name.to_string()))),
            ("execute", None) => Ok(Event::Execute),
            ("validate", None) => Ok(Event::Validate),
            ("explain", None) => Ok(Event::Explain),
            ("reload-schema", None) => Ok(Event::ReloadSchema),
            ("reset", None) => Ok(Event::Reset),
            ("search", Some(term)) => Ok(Event::Search(term.to_string())),
            ("prompt", Some(text)) => Ok(Event::Prompt(text.to_string())),
            ("edit", Some(sql)) => Ok(Event::Edit(sql.to_string())),
            ("wait", Some(value)) => self.parse_wait(value),
            ("snapshot", Some(name)) => Ok(Event::Snapshot(name.to_string())),
            ("assert", Some(value)) => self.parse_assert(value),
            ("prompt" | "edit" | "search" | "wait" | "snapshot" | "assert", None) => {
                Err(AssistantError::config(format!(
                    "Invalid event syntax: '{input}'. Expected format: {event_type}:value"
                )))
            }
            _ => Err(AssistantError::config(format!(
                "Unknown event: '{input}'. Valid events: connect, prompt, edit, execute, validate, \
                 explain, search, reload-schema, reset, wait, snapshot, assert"
            ))),
        }
    }

    /// Parses a wait duration like "100ms", "2s", or just "100" (defaults to ms).
    fn parse_wait(&self, value: &str) -> Result<Event> {
        let value = value.trim().to_lowercase();
        let invalid = || AssistantError::config(format!("Invalid duration: '{value}'"));

        let duration = if let Some(ms) = value.strip_suffix("ms") {
            Duration::from_millis(ms.parse().map_err(|_| invalid())?)
        } else if let Some(secs) = value.strip_suffix('s') {
            Duration::from_secs(secs.parse().map_err(|_| invalid())?)
        } else {
            Duration::from_millis(value.parse().map_err(|_| invalid())?)
        };

        Ok(Event::Wait(duration))
    }

    /// Parses an assertion like "contains:hello" or "state:connected=true".
    fn parse_assert(&self, value: &str) -> Result<Event> {
        let Some((assert_type, rest)) = value.split_once(':') else {
            return Err(AssistantError::config(format!(
                "Invalid assertion syntax: '{value}'. Expected assert:type:value"
            )));
        };
        let rest = rest.trim();

        let assertion = match assert_type.trim().to_lowercase().as_str() {
            "contains" => Assertion::Contains(rest.to_string()),
            "contains-exact" => Assertion::ContainsExact(rest.to_string()),
            "not-contains" => Assertion::NotContains(rest.to_string()),
            "matches" => {
                regex::Regex::new(rest).map_err(|e| {
                    AssistantError::config(format!("Invalid regex '{rest}': {e}"))
                })?;
                Assertion::Matches(rest.to_string())
            }
            "state" => self.parse_state_assertion(rest)?,
            other => {
                return Err(AssistantError::config(format!(
                    "Unknown assertion type: '{other}'. Valid types: contains, contains-exact, \
                     not-contains, matches, state"
                )));
            }
        };

        Ok(Event::Assert(assertion))
    }

    /// Parses a state assertion like "connected=true" or "message_count>=2".
    ///
    /// The field name ends at the first non-identifier character, so values
    /// may themselves contain operators (`draft=SELECT 1 >= 0`).
    fn parse_state_assertion(&self, value: &str) -> Result<Assertion> {
        let split = value
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(value.len());
        let (field, rest) = value.split_at(split);
        let field = field.to_string();

        for op in [">=", "<=", "==", ">", "<", "="] {
            if let Some(val) = rest.strip_prefix(op) {
                let val = val.trim().to_string();
                return Ok(if matches!(op, "=" | "==") {
                    Assertion::StateEquals { field, value: val }
                } else {
                    Assertion::StateCompare {
                        field,
                        op: op.to_string(),
                        value: val,
                    }
                });
            }
        }

        Err(AssistantError::config(format!(
            "Invalid state assertion: '{value}'. Expected field=value or field>=value"
        )))
    }
}

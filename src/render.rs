//! Plain-text rendering of the assistant's panels.
//!
//! Produces the screen used by headless mode and the interactive prompt.
//! Panels appear top to bottom in the order built by `render_screen`.

use crate::app::Assistant;
use crate::conversation::ConversationEntry;
use crate::query::{display_value, DraftReview, ExecutionOutcome, ResultView};
use crate::schema::{SchemaIndex, SchemaSnapshot, SchemaState, TableInfo};

/// Characters of generated SQL shown inline in the conversation.
pub const SQL_PREVIEW_CHARS: usize = 100;

/// Widest a result cell is drawn before it is cut.
const MAX_CELL_WIDTH: usize = 40;

/// Shortens SQL for the conversation panel.
pub fn sql_preview(sql: &str) -> String {
    truncate_chars(sql, SQL_PREVIEW_CHARS)
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max).collect();
        format!("{head}...")
    }
}

/// Renders every panel for the assistant's current state.
pub fn render_screen(assistant: &Assistant) -> String {
    let mut sections = vec![render_connection(assistant)];

    if let Some(workspace) = assistant.workspace() {
        sections.push(render_schema(workspace.schema()));
        sections.push(render_conversation(&workspace.conversation().entries()));
        sections.push(render_draft(&workspace.draft().text()));
        let reviewing = workspace.review().is_in_flight();
        let review = workspace.last_review();
        if reviewing || review.is_some() {
            sections.push(render_review(review.as_ref(), reviewing));
        }
        sections.push(render_results(
            workspace.outcome().as_ref(),
            workspace.execution().is_in_flight(),
        ));
    }

    sections.join("\n")
}

pub fn render_connection(assistant: &Assistant) -> String {
    let mut out = String::from("== Connection ==\n");
    match assistant.session() {
        Some(session) => {
            out.push_str(&session.banner());
            out.push('\n');
        }
        None => {
            out.push_str("Not connected\n");
            if let Some(error) = assistant.last_connection_error() {
                out.push_str(&format!("Error: {error}\n"));
            }
        }
    }
    out
}

pub fn render_schema(index: &SchemaIndex) -> String {
    let state = index.state();
    let title = match &state {
        SchemaState::Ready(snapshot) if !snapshot.database_name.is_empty() => {
            format!("== Database Schema ({}) ==\n", snapshot.database_name)
        }
        _ => "== Database Schema ==\n".to_string(),
    };

    let mut out = title;
    match state {
        SchemaState::Loading => out.push_str("Loading schema...\n"),
        SchemaState::Failed(message) => {
            out.push_str(&format!("Failed to load schema: {message}\n"))
        }
        SchemaState::Ready(snapshot) => {
            let search = index.search();
            if !search.is_empty() {
                out.push_str(&format!("Search: {search}\n"));
            }
            let tables = index.visible_tables();
            out.push_str(&format!("Tables ({})\n", tables.len()));
            for table in &tables {
                out.push_str(&render_table(table));
            }
            out.push_str(&render_schema_footer(&snapshot));
        }
    }
    out
}

/// Product and version line, empty when the service sent neither.
fn render_schema_footer(snapshot: &SchemaSnapshot) -> String {
    let product = snapshot.metadata_text("databaseProductName");
    let version = snapshot.metadata_text("databaseProductVersion");
    if product.is_none() && version.is_none() {
        return String::new();
    }
    format!(
        "Product: {}  Version: {}\n",
        product.unwrap_or_default(),
        version.unwrap_or_default()
    )
}

fn render_table(table: &TableInfo) -> String {
    let mut out = format!("  {} ({} columns)\n", table.name, table.columns.len());
    for column in &table.columns {
        let badges = column.annotations();
        if badges.is_empty() {
            out.push_str(&format!("    {} {}\n", column.name, column.column_type));
        } else {
            out.push_str(&format!(
                "    {} {} [{}]\n",
                column.name,
                column.column_type,
                badges.join(", ")
            ));
        }
    }
    out
}

pub fn render_conversation(entries: &[ConversationEntry]) -> String {
    let mut out = String::from("== Conversation ==\n");
    for entry in entries {
        out.push_str(&format!("[{}] {}\n", entry.role.label(), entry.text));
        if let Some(sql) = &entry.sql {
            out.push_str(&format!("  SQL: {}\n", sql_preview(sql)));
        }
    }
    out
}

pub fn render_draft(text: &str) -> String {
    if text.trim().is_empty() {
        "== SQL ==\n(empty)\n".to_string()
    } else {
        format!("== SQL ==\n{}\n", text.trim_end())
    }
}

pub fn render_review(review: Option<&DraftReview>, in_flight: bool) -> String {
    let mut out = String::from("== Review ==\n");
    if in_flight {
        out.push_str("Reviewing...\n");
        return out;
    }
    match review {
        None => {}
        Some(DraftReview::Explanation(text)) => {
            out.push_str(text.trim_end());
            out.push('\n');
        }
        Some(DraftReview::Failure { message }) => out.push_str(&format!("Error: {message}\n")),
        Some(DraftReview::Validation(validation)) => {
            out.push_str(if validation.is_valid {
                "Query is valid\n"
            } else {
                "Query is invalid\n"
            });
            for error in &validation.errors {
                out.push_str(&format!("Error: {error}\n"));
            }
            for warning in &validation.warnings {
                out.push_str(&format!("Warning: {warning}\n"));
            }
            for suggestion in &validation.suggestions {
                out.push_str(&format!("Suggestion: {suggestion}\n"));
            }
        }
    }
    out
}

pub fn render_results(outcome: Option<&ExecutionOutcome>, in_flight: bool) -> String {
    let mut out = String::from("== Results ==\n");
    if in_flight {
        out.push_str("Executing...\n");
        return out;
    }
    let Some(outcome) = outcome else {
        out.push_str("No results yet\n");
        return out;
    };

    match ResultView::of(outcome) {
        ResultView::Error(message) => out.push_str(&format!("Error: {message}\n")),
        ResultView::Table {
            columns,
            rows,
            note,
            label,
        } => {
            out.push_str(&format!("Query executed successfully ({label})\n"));
            if !columns.is_empty() {
                let cells: Vec<Vec<String>> = rows
                    .iter()
                    .map(|row| {
                        columns
                            .iter()
                            .map(|c| {
                                let value = row.get(c).map(display_value).unwrap_or_default();
                                truncate_chars(&value, MAX_CELL_WIDTH)
                            })
                            .collect()
                    })
                    .collect();
                out.push_str(&render_grid(columns, &cells));
            }
            if let Some(note) = note {
                out.push_str(&format!("({note})\n"));
            }
        }
    }
    out
}

fn render_grid(columns: &[String], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            rows.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = grid_line(columns, &widths);
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("|-{}-|\n", separator.join("-|-")));
    for row in rows {
        out.push_str(&grid_line(row, &widths));
    }
    out
}

fn grid_line(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    format!("| {} |\n", padded.join(" | "))
}

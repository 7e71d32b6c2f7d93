//! Line-oriented interactive mode.
//!
//! Reads one event per line from stdin, using the headless event language,
//! and reprints the panels after each one.

use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::error::{AssistantError, Result};
use crate::headless::{EventDriver, EventParser};

const HELP: &str = "\
Commands (one per line):
  connect | connect:<name>    probe and open a session
  prompt:<text>               generate SQL from natural language
  edit:<sql>                  replace the SQL draft
  execute                     run the current draft
  validate                    check the draft without running it
  explain                     describe what the draft does
  search:<term>               filter the schema tree (empty clears)
  reload-schema               retry the schema fetch
  reset                       close the session
  assert:<kind>:<value>       check the screen or state
  help | quit";

/// Runs the interactive loop until EOF or `quit`.
pub async fn run_interactive(mut driver: EventDriver) -> Result<()> {
    let parser = EventParser::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", driver.screen());
    println!("Type 'help' for commands.");

    loop {
        print!("> ");
        std::io::stdout()
            .flush()
            .map_err(|e| AssistantError::internal(format!("Failed to write prompt: {e}")))?;

        let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| AssistantError::internal(format!("Failed to read input: {e}")))?
        else {
            break;
        };

        let line = line.trim();
        match line {
            "" => continue,
            "quit" | "exit" => break,
            "help" => {
                println!("{HELP}");
                continue;
            }
            _ => {}
        }

        match parser.parse_one(line) {
            Ok(event) => match driver.apply(&event).await {
                Some(true) => println!("PASS: {event}"),
                Some(false) => println!("FAIL: {event}"),
                None => println!("{}", driver.screen()),
            },
            Err(e) => println!("{e}"),
        }
    }

    info!("Interactive session ended");
    Ok(())
}

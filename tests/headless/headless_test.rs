//! Runs the `sql-assistant` binary in headless mode against the demo service.

use std::process::Command;

fn run_headless(args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_sql-assistant"))
        .args(["--mock", "--kind", "sqlite", "--database", "/tmp/demo.db"])
        .args(args)
        .env_remove("SQL_ASSISTANT_API_URL")
        .env_remove("SQL_ASSISTANT_TOKEN")
        .env_remove("SQL_ASSISTANT_DB_PASSWORD")
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to execute command");

    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    (exit_code, stdout, stderr)
}

#[test]
fn test_headless_basic_execution() {
    let (code, stdout, _) = run_headless(&["--event", "connect"]);

    assert_eq!(code, 0, "Expected exit code 0");
    assert!(stdout.contains("Connected to SQLITE database: /tmp/demo.db"));
    assert!(stdout.contains("Events: 1 executed"));
}

#[test]
fn test_headless_full_flow_json() {
    let (code, stdout, stderr) = run_headless(&[
        "--event",
        "connect",
        "--event",
        "prompt:show all users",
        "--event",
        "execute",
        "--event",
        "assert:contains:showing first 10 of 12",
        "--event",
        "assert:state:outcome=success",
        "--output",
        "json",
    ]);

    assert_eq!(code, 0, "stderr: {stderr}");
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["assertions"]["passed"], 2);
    assert_eq!(json["assertions"]["failed"], 0);
    assert_eq!(json["state"]["draft"], "SELECT * FROM users;");
    assert_eq!(json["state"]["message_count"], 3);
}

#[test]
fn test_headless_review_events() {
    let (code, stdout, stderr) = run_headless(&[
        "--event",
        "connect",
        "--event",
        "assert:contains:Product: SQLite  Version: 3.45.1",
        "--event",
        "prompt:count orders",
        "--event",
        "explain",
        "--event",
        "assert:contains:Counts all orders.",
        "--event",
        "edit:DELETE FROM orders",
        "--event",
        "validate",
        "--event",
        "assert:state:review=invalid",
    ]);

    assert_eq!(code, 0, "stdout: {stdout}\nstderr: {stderr}");
    assert!(stdout.contains("Query is invalid"));
    assert!(stdout.contains("validate: completed"));
}

#[test]
fn test_headless_assertion_fail() {
    let (code, stdout, _) = run_headless(&[
        "--event",
        "connect",
        "--event",
        "assert:contains:goodbye",
        "--output",
        "json",
    ]);

    assert_eq!(code, 1, "Should exit with code 1 on assertion failure");
    assert!(stdout.contains(r#""passed": 0"#));
    assert!(stdout.contains(r#""failed": 1"#));
}

#[test]
fn test_headless_script_file() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("demo.events");
    std::fs::write(
        &script,
        "# search then edit\nconnect\nsearch:ema\nassert:state:visible_tables=users\n\
         edit:SELECT id, email FROM users;\nassert:state:draft=SELECT id, email FROM users;\n",
    )
    .unwrap();

    let (code, stdout, _) = run_headless(&["--script", script.to_str().unwrap()]);
    assert_eq!(code, 0, "stdout: {stdout}");
    assert!(stdout.contains("Assertions: 2 passed, 0 failed"));
}

#[test]
fn test_headless_frames_and_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("frames.txt");

    let (code, stdout, _) = run_headless(&[
        "--event",
        "connect",
        "--event",
        "reset",
        "--output",
        "frames",
        "--output-file",
        out.to_str().unwrap(),
    ]);

    assert_eq!(code, 0);
    assert!(stdout.is_empty());
    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.contains("=== FRAME 0 (initial) ==="));
    assert!(written.contains("=== FRAME 2 (reset) ==="));
}

#[test]
fn test_headless_invalid_event_fails() {
    let (code, _, stderr) = run_headless(&["--event", "dance"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Unknown event"));
}

#[test]
fn test_headless_requires_events() {
    let (code, _, stderr) = run_headless(&["--headless"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("requires --event or --script"));
}

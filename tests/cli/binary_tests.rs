//! Exit status and output of the compiled binary

use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn message_etl() -> Command {
    Command::new(env!("CARGO_BIN_EXE_message-etl"))
}

#[test]
fn test_binary_reports_stage_on_failure() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("messages.csv"), "id,text\n1,help\n2,food\n").unwrap();
    fs::write(
        dir.path().join("categories.csv"),
        "id,categories\n1,related-1;request-0\n2,related-0\n",
    )
    .unwrap();

    let output = message_etl()
        .current_dir(dir.path())
        .args([
            "run",
            "messages.csv",
            "categories.csv",
            "duckdb://:memory:",
        ])
        .env("RUST_LOG", "off")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: decode: "), "stderr: {}", stderr);
}

#[test]
fn test_binary_schema_prints_names() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("categories.csv"),
        "id,categories\n1,related-1;request-0;offer-0\n",
    )
    .unwrap();

    let output = message_etl()
        .current_dir(dir.path())
        .args(["schema", "categories.csv", "--format", "json"])
        .env("RUST_LOG", "off")
        .output()
        .unwrap();

    assert!(output.status.success());
    let names: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(names, vec!["related", "request", "offer"]);
}

#[test]
fn test_binary_rejects_key_with_positional() {
    let output = message_etl()
        .args(["run", "m.csv", "c.csv", "--key", "id", "--positional"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

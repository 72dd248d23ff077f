//! Run command tests

use message_etl::DuckDbSink;
use message_etl::cli::commands::run::{ReportFormat, RunArgs, format_report, handle_run};
use message_etl::cli::error::CliError;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_inputs(dir: &Path) {
    fs::write(
        dir.join("messages.csv"),
        "id,message,genre\n1,help,direct\n2,food,news\n3,water,direct\n",
    )
    .unwrap();
    fs::write(
        dir.join("categories.csv"),
        "id,categories\n1,related-1;request-0;offer-0\n2,related-0;request-1;offer-0\n3,related-1;request-1;offer-1\n",
    )
    .unwrap();
}

fn empty_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("empty.toml");
    fs::write(&path, "").unwrap();
    path
}

#[test]
fn test_cli_run_with_positional_arguments() {
    let dir = tempdir().unwrap();
    write_inputs(dir.path());
    let db_path = dir.path().join("etl.duckdb");

    let args = RunArgs {
        messages: Some(dir.path().join("messages.csv")),
        categories: Some(dir.path().join("categories.csv")),
        destination: Some(db_path.display().to_string()),
        table: Some("labelled".to_string()),
        config: Some(empty_config(dir.path())),
        format: ReportFormat::Json,
        ..Default::default()
    };

    let report = handle_run(&args).unwrap();
    assert_eq!(report.written_rows, Some(3));
    assert_eq!(report.categories, vec!["related", "request", "offer"]);

    let table = DuckDbSink::new(&db_path)
        .unwrap()
        .read_table("labelled")
        .unwrap();
    assert_eq!(
        table.columns(),
        &["id", "message", "genre", "related", "request", "offer"]
    );

    let text = format_report(&report, ReportFormat::Text).unwrap();
    assert!(text.contains("Rows written:        3"));
    assert!(text.contains("table labelled"));
}

#[test]
fn test_cli_run_from_config_file() {
    let dir = tempdir().unwrap();
    write_inputs(dir.path());
    let config_path = dir.path().join("message-etl.toml");
    fs::write(
        &config_path,
        format!(
            "[input]\nmessages = \"{}\"\ncategories = \"{}\"\n\n[output]\ndestination = \"duckdb://{}\"\ntable = \"from_config\"\n",
            dir.path().join("messages.csv").display(),
            dir.path().join("categories.csv").display(),
            dir.path().join("config.duckdb").display(),
        ),
    )
    .unwrap();

    let args = RunArgs {
        config: Some(config_path),
        ..Default::default()
    };
    let report = handle_run(&args).unwrap();
    assert_eq!(report.table, "from_config");
    assert!(dir.path().join("config.duckdb").exists());
}

#[test]
fn test_cli_run_rejects_unsupported_destination() {
    let dir = tempdir().unwrap();
    write_inputs(dir.path());

    let args = RunArgs {
        messages: Some(dir.path().join("messages.csv")),
        categories: Some(dir.path().join("categories.csv")),
        destination: Some("mysql://etl@localhost/db".to_string()),
        config: Some(empty_config(dir.path())),
        ..Default::default()
    };
    let err = handle_run(&args).unwrap_err();
    assert!(matches!(err, CliError::Pipeline(_)));
    assert!(err.to_string().starts_with("write: "));
}

#[test]
fn test_cli_run_rejects_bad_table_name() {
    let dir = tempdir().unwrap();
    write_inputs(dir.path());

    let args = RunArgs {
        messages: Some(dir.path().join("messages.csv")),
        categories: Some(dir.path().join("categories.csv")),
        destination: Some("duckdb://:memory:".to_string()),
        table: Some("messages; DROP TABLE x".to_string()),
        config: Some(empty_config(dir.path())),
        ..Default::default()
    };
    assert!(handle_run(&args).is_err());
}

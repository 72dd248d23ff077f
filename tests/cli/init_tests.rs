//! Init-config command tests

use message_etl::PipelineConfig;
use message_etl::cli::commands::init::{InitConfigArgs, handle_init_config};
use message_etl::cli::error::CliError;
use tempfile::tempdir;

#[test]
fn test_cli_init_config_creates_parent_dirs() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("conf").join("etl.toml");

    let written = handle_init_config(&InitConfigArgs {
        path: path.clone(),
        force: false,
    })
    .unwrap();
    assert_eq!(written, path);

    let config = PipelineConfig::load(&path).unwrap();
    assert_eq!(config.output.table, "messages");
}

#[test]
fn test_cli_init_config_twice_needs_force() {
    let dir = tempdir().unwrap();
    let args = InitConfigArgs {
        path: dir.path().to_path_buf(),
        force: false,
    };
    handle_init_config(&args).unwrap();
    assert!(matches!(
        handle_init_config(&args),
        Err(CliError::FileExists(_))
    ));
}

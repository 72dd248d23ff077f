//! CLI-specific error types

use crate::config::ConfigError;
use crate::error::PipelineError;
use std::path::PathBuf;
use thiserror::Error;

/// CLI-specific error type
#[derive(Error, Debug)]
pub enum CliError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to write file {0}: {1}")]
    FileWriteError(PathBuf, String),

    #[error("{0} already exists; use --force to overwrite")]
    FileExists(PathBuf),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    /// Already prefixed with the failing stage
    #[error("{0}")]
    Pipeline(#[from] PipelineError),
}

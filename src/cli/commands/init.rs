//! Init-config command implementation

use std::path::PathBuf;

use crate::cli::error::CliError;
use crate::config::{CONFIG_FILENAME, sample_config};

/// Arguments for the init-config command
#[derive(Debug, Clone)]
pub struct InitConfigArgs {
    /// Target file, or a directory to place `message-etl.toml` in
    pub path: PathBuf,
    /// Overwrite an existing file
    pub force: bool,
}

/// Handle the init-config command, returning the path written
pub fn handle_init_config(args: &InitConfigArgs) -> Result<PathBuf, CliError> {
    let path = if args.path.is_dir() {
        args.path.join(CONFIG_FILENAME)
    } else {
        args.path.clone()
    };

    if path.exists() && !args.force {
        return Err(CliError::FileExists(path));
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)
            .map_err(|e| CliError::FileWriteError(parent.to_path_buf(), e.to_string()))?;
    }

    std::fs::write(&path, sample_config())
        .map_err(|e| CliError::FileWriteError(path.clone(), e.to_string()))?;

    println!("Wrote sample configuration to {}", path.display());
    Ok(path)
}

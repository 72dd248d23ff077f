//! CLI command implementations

pub mod init;
pub mod run;
pub mod schema;

use crate::cli::error::CliError;

/// Convert a delimiter argument into the single byte the loader expects
pub(crate) fn delimiter_byte(delimiter: char) -> Result<u8, CliError> {
    if delimiter.is_ascii() {
        Ok(delimiter as u8)
    } else {
        Err(CliError::InvalidArgument(format!(
            "delimiter must be a single ASCII character, got '{}'",
            delimiter
        )))
    }
}

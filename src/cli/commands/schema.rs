//! Schema command implementation
//!
//! Loads a categories file, decodes every row, and prints the category
//! names in column order. Nothing is written.

use std::path::PathBuf;

use crate::cli::commands::delimiter_byte;
use crate::cli::commands::run::ReportFormat;
use crate::cli::error::CliError;
use crate::decode::{DecodeOptions, FlagPolicy, NamePolicy, decode_labels};
use crate::error::PipelineError;
use crate::load::{LoadOptions, load_table};

/// Arguments for the schema command
#[derive(Debug, Clone)]
pub struct SchemaArgs {
    pub categories: PathBuf,
    pub column: String,
    pub delimiter: char,
    pub name_policy: NamePolicy,
    pub flag_policy: FlagPolicy,
    pub format: ReportFormat,
}

/// Handle the schema command, returning the category names
pub fn handle_schema(args: &SchemaArgs) -> Result<Vec<String>, CliError> {
    if !args.categories.exists() {
        return Err(CliError::FileNotFound(args.categories.clone()));
    }

    let options = LoadOptions {
        delimiter: delimiter_byte(args.delimiter)?,
        ..Default::default()
    };
    let table = load_table(&args.categories, &options).map_err(PipelineError::from)?;

    let decode_options = DecodeOptions {
        column: args.column.clone(),
        name_policy: args.name_policy,
        flag_policy: args.flag_policy,
        ..Default::default()
    };
    let decoded = decode_labels(&table, &decode_options).map_err(PipelineError::Decode)?;
    let names = decoded.schema.names().to_vec();

    match args.format {
        ReportFormat::Text => {
            for name in &names {
                println!("{}", name);
            }
            eprintln!(
                "{} categories, consistent across {} rows",
                names.len(),
                table.row_count()
            );
        }
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(&names)
                .map_err(|e| CliError::Serialization(e.to_string()))?;
            println!("{}", json);
        }
    }

    Ok(names)
}

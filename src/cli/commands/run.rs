//! Run command implementation

use std::path::{Path, PathBuf};

use crate::cli::commands::delimiter_byte;
use crate::cli::error::CliError;
use crate::config::{MergeMode, PipelineConfig};
use crate::decode::{FlagPolicy, NamePolicy};
use crate::pipeline::{Pipeline, RunReport};

/// How the run report is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// Aligned key/value lines (default)
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            _ => Err(format!("Unknown report format: {}", s)),
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Text => write!(f, "text"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}

/// Arguments for the run command
///
/// Every `Option` left as `None` falls back to the configuration file, then
/// to the built-in default.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    /// Messages file
    pub messages: Option<PathBuf>,
    /// Categories file
    pub categories: Option<PathBuf>,
    /// Destination connection string
    pub destination: Option<String>,
    /// Destination table name
    pub table: Option<String>,
    /// Explicit configuration file
    pub config: Option<PathBuf>,
    /// Join key column (implies a keyed join)
    pub key: Option<String>,
    /// Join by row position instead of a key
    pub positional: bool,
    /// Compound label column
    pub category_column: Option<String>,
    /// Field delimiter
    pub delimiter: Option<char>,
    pub name_policy: Option<NamePolicy>,
    pub flag_policy: Option<FlagPolicy>,
    /// Transform only, write nothing
    pub dry_run: bool,
    /// Report format
    pub format: ReportFormat,
}

/// Build the effective configuration: file, then environment, then arguments
pub fn resolve_config(args: &RunArgs) -> Result<PipelineConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::FileNotFound(path.clone()));
            }
            PipelineConfig::load(path)?
        }
        None => PipelineConfig::load_or_default(Path::new("."))?,
    };

    if let Some(messages) = &args.messages {
        config.input.messages = Some(messages.clone());
    }
    if let Some(categories) = &args.categories {
        config.input.categories = Some(categories.clone());
    }
    if let Some(destination) = &args.destination {
        config.output.destination = Some(destination.clone());
    }
    if let Some(table) = &args.table {
        config.output.table = table.clone();
    }
    if let Some(delimiter) = args.delimiter {
        delimiter_byte(delimiter)?;
        config.input.delimiter = delimiter.to_string();
    }
    if let Some(column) = &args.category_column {
        config.decode.column = column.clone();
    }
    if let Some(policy) = args.name_policy {
        config.decode.name_policy = policy;
    }
    if let Some(policy) = args.flag_policy {
        config.decode.flag_policy = policy;
    }

    match (&args.key, args.positional) {
        (Some(_), true) => {
            return Err(CliError::InvalidArgument(
                "--key and --positional cannot be combined".to_string(),
            ));
        }
        (Some(key), false) => {
            config.merge.strategy = MergeMode::Keyed;
            config.merge.key = key.clone();
        }
        (None, true) => config.merge.strategy = MergeMode::Positional,
        (None, false) => {}
    }

    Ok(config)
}

/// Render a run report
pub fn format_report(report: &RunReport, format: ReportFormat) -> Result<String, CliError> {
    match format {
        ReportFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| CliError::Serialization(e.to_string())),
        ReportFormat::Text => {
            let mut lines = Vec::new();
            let target = match &report.destination {
                Some(destination) => format!("{} (table {})", destination, report.table),
                None => format!("dry run (table {})", report.table),
            };
            lines.push(format!("Run {} -> {}", report.run_id, target));
            lines.push(format!("  Message rows:        {}", report.message_rows));
            lines.push(format!("  Category rows:       {}", report.category_rows));
            lines.push(format!(
                "  Categories:          {} ({})",
                report.categories.len(),
                report.categories.join(", ")
            ));
            if report.clamped_flags > 0 {
                lines.push(format!("  Clamped flags:       {}", report.clamped_flags));
            }
            lines.push(format!("  Merged rows:         {}", report.merged_rows));
            lines.push(format!("  Duplicates removed:  {}", report.duplicates_removed));
            match report.written_rows {
                Some(written) => lines.push(format!("  Rows written:        {}", written)),
                None => lines.push(format!("  Rows (not written):  {}", report.cleaned_rows)),
            }
            lines.push(format!("  Duration:            {}", report.duration_string()));
            Ok(lines.join("\n"))
        }
    }
}

/// Handle the run command
pub fn handle_run(args: &RunArgs) -> Result<RunReport, CliError> {
    let config = resolve_config(args)?;
    let pipeline = Pipeline::new(config);

    let report = if args.dry_run {
        pipeline.dry_run()?.report
    } else {
        pipeline.run()?
    };

    println!("{}", format_report(&report, args.format)?);
    Ok(report)
}

//! Pipeline driver
//!
//! Runs load → decode → merge → deduplicate → write. Each stage takes its
//! inputs by reference and returns a new value; nothing is shared between
//! stages except what is passed along.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::dedup::deduplicate;
use crate::decode::decode_labels;
use crate::error::{PipelineError, PipelineResult};
use crate::load::load_table;
use crate::merge::merge_tables;
use crate::models::Table;
use crate::sink::{Destination, TableSink, open_sink};

/// Summary of a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Unique run identifier
    pub run_id: Uuid,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Rows read from the messages file
    pub message_rows: usize,
    /// Rows read from the categories file
    pub category_rows: usize,
    /// Category names, in column order
    pub categories: Vec<String>,
    /// Flags changed by the clamp policy
    pub clamped_flags: usize,
    /// Rows after merging
    pub merged_rows: usize,
    /// Exact duplicates removed
    pub duplicates_removed: usize,
    /// Rows in the cleaned table
    pub cleaned_rows: usize,
    /// Rows written to the destination (None for dry runs)
    pub written_rows: Option<usize>,
    /// Destination with credentials masked (None for dry runs)
    pub destination: Option<String>,
    /// Destination table name
    pub table: String,
    /// Duration of the run
    #[serde(skip)]
    pub duration: Duration,
}

impl RunReport {
    fn new(table: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            message_rows: 0,
            category_rows: 0,
            categories: Vec::new(),
            clamped_flags: 0,
            merged_rows: 0,
            duplicates_removed: 0,
            cleaned_rows: 0,
            written_rows: None,
            destination: None,
            table: table.to_string(),
            duration: Duration::ZERO,
        }
    }

    /// Format duration as human-readable string
    pub fn duration_string(&self) -> String {
        let millis = self.duration.as_millis();
        if millis < 1000 {
            format!("{}ms", millis)
        } else {
            let secs = self.duration.as_secs();
            if secs < 60 {
                format!("{:.1}s", self.duration.as_secs_f64())
            } else {
                format!("{}m {}s", secs / 60, secs % 60)
            }
        }
    }
}

/// Output of the transformation stages, before writing
#[derive(Debug, Clone)]
pub struct Transformed {
    /// Cleaned table ready to persist
    pub table: Table,
    /// Report with every pre-write count filled in
    pub report: RunReport,
}

/// Batch pipeline built from a [`PipelineConfig`]
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load both inputs, transform, and write to the configured destination
    pub fn run(&self) -> PipelineResult<RunReport> {
        self.config.validate(true)?;
        let destination: Destination = self.config.destination()?.parse()?;
        let mut sink = open_sink(&destination)?;

        let mut report = self.run_with_sink(sink.as_mut())?;
        report.destination = Some(destination.masked());
        Ok(report)
    }

    /// Like [`Pipeline::run`], writing to a caller-supplied sink
    pub fn run_with_sink(&self, sink: &mut dyn TableSink) -> PipelineResult<RunReport> {
        let start = Instant::now();
        let Transformed { table, mut report } = self.load_and_transform()?;

        tracing::info!(table = %report.table, rows = table.row_count(), "Writing cleaned table");
        let written = sink.write_table(&self.config.output.table, &table)?;
        report.written_rows = Some(written);
        report.duration = start.elapsed();

        tracing::info!(
            run_id = %report.run_id,
            written,
            duplicates = report.duplicates_removed,
            "Pipeline finished in {}",
            report.duration_string()
        );
        Ok(report)
    }

    /// Load both inputs and transform them without writing
    pub fn dry_run(&self) -> PipelineResult<Transformed> {
        self.config.validate(false)?;
        let start = Instant::now();
        let mut transformed = self.load_and_transform()?;
        transformed.report.duration = start.elapsed();
        Ok(transformed)
    }

    fn load_and_transform(&self) -> PipelineResult<Transformed> {
        let options = self.config.load_options()?;
        let messages = load_table(self.config.messages_path()?, &options)?;
        let categories = load_table(self.config.categories_path()?, &options)?;
        self.transform(&messages, &categories)
    }

    /// Decode, merge and deduplicate already-loaded tables
    pub fn transform(&self, messages: &Table, categories: &Table) -> PipelineResult<Transformed> {
        let mut report = RunReport::new(&self.config.output.table);
        report.message_rows = messages.row_count();
        report.category_rows = categories.row_count();

        let decoded = decode_labels(categories, &self.config.decode_options())
            .map_err(PipelineError::Decode)?;
        report.categories = decoded.schema.names().to_vec();
        report.clamped_flags = decoded.clamped;

        let merged = merge_tables(messages, &decoded.table, &self.config.join_strategy())
            .map_err(PipelineError::Merge)?;
        report.merged_rows = merged.row_count();

        let outcome = deduplicate(&merged);
        report.duplicates_removed = outcome.removed;
        report.cleaned_rows = outcome.table.row_count();

        Ok(Transformed {
            table: outcome.table,
            report,
        })
    }
}

//! message-etl - batch ETL for labelled message datasets
//!
//! Provides:
//! - Delimited text loading with per-column type inference
//! - Decoding of compound `name-flag;name-flag` label columns
//! - Keyed (or checked positional) joining of messages with labels
//! - Exact-duplicate removal
//! - Overwrite writes to DuckDB, SQLite or PostgreSQL
//! - A pipeline driver tying the stages together

pub mod config;
pub mod decode;
pub mod dedup;
pub mod error;
pub mod load;
pub mod merge;
pub mod models;
pub mod pipeline;
pub mod sink;

#[cfg(feature = "cli")]
pub mod cli;

pub use config::{ConfigError, PipelineConfig};
pub use decode::{CategorySchema, DecodeOptions, DecodedLabels, FlagPolicy, NamePolicy};
pub use dedup::DedupOutcome;
pub use error::{PipelineError, PipelineResult, SchemaMismatchError};
pub use load::{LoadOptions, ReadError};
pub use merge::JoinStrategy;
pub use models::{SqlType, Table, Value};
pub use pipeline::{Pipeline, RunReport, Transformed};
pub use sink::{Destination, TableSink, WriteError};

#[cfg(feature = "duckdb-backend")]
pub use sink::DuckDbSink;
#[cfg(feature = "postgres-backend")]
pub use sink::PostgresSink;
#[cfg(feature = "sqlite-backend")]
pub use sink::SqliteSink;

//! Pipeline error types
//!
//! Each stage owns its error type: [`ReadError`] for loading,
//! [`SchemaMismatchError`] for decoding and merging, [`WriteError`] for the
//! sink. [`PipelineError`] records which stage failed.

use thiserror::Error;

use crate::config::ConfigError;
use crate::load::ReadError;
use crate::sink::WriteError;

/// Structural inconsistency between rows, columns or tables
///
/// Row numbers are 1-based data rows (the header is not counted).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaMismatchError {
    #[error("duplicate column name '{column}'")]
    DuplicateColumn { column: String },

    #[error("row {row} has {actual} values, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("column '{column}' not found")]
    MissingColumn { column: String },

    #[error("no data rows to infer the category schema from")]
    NoRows,

    #[error("row {row} has {actual} category segments, expected {expected}")]
    SegmentCount {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("row {row}, segment {position}: category '{actual}' does not match '{expected}'")]
    CategoryMismatch {
        row: usize,
        position: usize,
        expected: String,
        actual: String,
    },

    #[error("row {row}: segment '{segment}' is not of the form name-flag")]
    InvalidSegment { row: usize, segment: String },

    #[error("row {row}: segment '{segment}' has an empty category name")]
    EmptyCategoryName { row: usize, segment: String },

    #[error("row {row}: category '{category}' has invalid flag '{value}'")]
    InvalidFlag {
        row: usize,
        category: String,
        value: String,
    },

    #[error("category name '{name}' occurs more than once")]
    DuplicateCategory { name: String },

    #[error("{table} table has no key column '{column}'")]
    MissingKey { table: &'static str, column: String },

    #[error("key {key} from the {table} table has no matching row")]
    UnmatchedKey { table: &'static str, key: String },

    #[error("column '{column}' exists in both tables")]
    ColumnCollision { column: String },

    #[error("row count mismatch: {messages} messages vs {categories} category rows")]
    RowCountMismatch { messages: usize, categories: usize },

    #[error("row {row}: shared column '{column}' differs between tables")]
    Misaligned { row: usize, column: String },
}

/// Failure of a pipeline run, tagged with the stage that failed
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("load: {0}")]
    Load(#[from] ReadError),

    #[error("decode: {0}")]
    Decode(#[source] SchemaMismatchError),

    #[error("merge: {0}")]
    Merge(#[source] SchemaMismatchError),

    #[error("write: {0}")]
    Write(#[from] WriteError),
}

impl PipelineError {
    /// Name of the stage that failed
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Config(_) => "config",
            PipelineError::Load(_) => "load",
            PipelineError::Decode(_) => "decode",
            PipelineError::Merge(_) => "merge",
            PipelineError::Write(_) => "write",
        }
    }
}

/// Result type for pipeline runs
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_prefix() {
        let err = PipelineError::Decode(SchemaMismatchError::SegmentCount {
            row: 2,
            expected: 3,
            actual: 2,
        });
        assert_eq!(err.stage(), "decode");
        assert_eq!(
            err.to_string(),
            "decode: row 2 has 2 category segments, expected 3"
        );
    }
}

//! Delimited text loading
//!
//! Reads a delimited file with a header row into a [`Table`]. Column names
//! pass through unchanged (surrounding whitespace trimmed); values are typed
//! per column when type inference is enabled.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Table, Value};

/// Error while reading an input file
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed input {path}{}: {message}", line_suffix(.line))]
    Malformed {
        path: PathBuf,
        line: Option<u64>,
        message: String,
    },

    #[error("{0} has no header or no data rows")]
    Empty(PathBuf),

    #[error("{path} has duplicate header '{column}'")]
    DuplicateHeader { path: PathBuf, column: String },
}

/// Options for reading delimited text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Field delimiter byte
    pub delimiter: u8,
    /// Type columns whose every non-empty field is an integer as `Integer`
    pub infer_types: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            infer_types: true,
        }
    }
}

/// Load a delimited file into a table
pub fn load_table(path: &Path, options: &LoadOptions) -> Result<Table, ReadError> {
    if !path.exists() {
        return Err(ReadError::NotFound(path.to_path_buf()));
    }

    let file = File::open(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let table = load_reader(file, path, options)?;
    tracing::info!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.column_count(),
        "Loaded table"
    );
    Ok(table)
}

/// Load delimited text from any reader
///
/// `source` is only used to label errors.
pub fn load_reader<R: Read>(
    reader: R,
    source: &Path,
    options: &LoadOptions,
) -> Result<Table, ReadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| csv_error(source, e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(ReadError::Empty(source.to_path_buf()));
    }

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| csv_error(source, e))?;
        raw_rows.push(record.iter().map(str::to_string).collect());
    }

    if raw_rows.is_empty() {
        return Err(ReadError::Empty(source.to_path_buf()));
    }

    let integer_columns: Vec<bool> = (0..headers.len())
        .map(|i| {
            options.infer_types
                && raw_rows
                    .iter()
                    .all(|row| {
                        row[i].is_empty() || Value::parse_canonical_integer(&row[i]).is_some()
                    })
        })
        .collect();

    let rows = raw_rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&integer_columns)
                .map(|(field, &integer)| {
                    if field.is_empty() {
                        Value::Null
                    } else if integer {
                        Value::infer(&field)
                    } else {
                        Value::Text(field)
                    }
                })
                .collect()
        })
        .collect();

    Table::new(headers, rows).map_err(|e| match e {
        crate::error::SchemaMismatchError::DuplicateColumn { column } => ReadError::DuplicateHeader {
            path: source.to_path_buf(),
            column,
        },
        other => ReadError::Malformed {
            path: source.to_path_buf(),
            line: None,
            message: other.to_string(),
        },
    })
}

fn line_suffix(line: &Option<u64>) -> String {
    line.map(|l| format!(" at line {}", l)).unwrap_or_default()
}

fn csv_error(path: &Path, e: csv::Error) -> ReadError {
    let line = e.position().map(|p| p.line());
    if e.is_io_error() {
        if let csv::ErrorKind::Io(source) = e.into_kind() {
            return ReadError::Io {
                path: path.to_path_buf(),
                source,
            };
        }
        return ReadError::Malformed {
            path: path.to_path_buf(),
            line,
            message: "I/O error".to_string(),
        };
    }
    ReadError::Malformed {
        path: path.to_path_buf(),
        line,
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn load_str(input: &str) -> Result<Table, ReadError> {
        load_reader(input.as_bytes(), Path::new("test.csv"), &LoadOptions::default())
    }

    #[test]
    fn test_load_infers_integer_columns() {
        let table = load_str("id,message,genre\n1,help,direct\n2,food,\n").unwrap();
        assert_eq!(table.columns(), &["id", "message", "genre"]);
        assert_eq!(
            table.rows()[0],
            vec![Value::Integer(1), Value::from("help"), Value::from("direct")]
        );
        assert_eq!(table.rows()[1][2], Value::Null);
    }

    #[test]
    fn test_mixed_column_stays_text() {
        let table = load_str("code\n12\nA7\n").unwrap();
        assert_eq!(table.rows()[0][0], Value::from("12"));
        assert_eq!(table.rows()[1][0], Value::from("A7"));
    }

    #[test]
    fn test_leading_zeros_keep_column_as_text() {
        let table = load_str("id,zip\n1,007\n2,010\n3,+5\n").unwrap();
        assert_eq!(table.rows()[0][0], Value::Integer(1));
        assert_eq!(table.rows()[0][1], Value::from("007"));
        assert_eq!(table.rows()[1][1], Value::from("010"));
        assert_eq!(table.rows()[2][1], Value::from("+5"));
        assert_eq!(table.sql_type(1), crate::models::SqlType::Text);
    }

    #[test]
    fn test_inference_disabled() {
        let options = LoadOptions {
            infer_types: false,
            ..Default::default()
        };
        let table = load_reader("id\n1\n".as_bytes(), Path::new("t.csv"), &options).unwrap();
        assert_eq!(table.rows()[0][0], Value::from("1"));
    }

    #[test]
    fn test_quoted_fields_keep_delimiters() {
        let table = load_str("id,message\n1,\"water, food; shelter\"\n").unwrap();
        assert_eq!(table.rows()[0][1], Value::from("water, food; shelter"));
    }

    #[test]
    fn test_custom_delimiter() {
        let options = LoadOptions {
            delimiter: b'\t',
            ..Default::default()
        };
        let table = load_reader("id\ttext\n1\ta,b\n".as_bytes(), Path::new("t.tsv"), &options)
            .unwrap();
        assert_eq!(table.rows()[0][1], Value::from("a,b"));
    }

    #[test]
    fn test_ragged_row_is_malformed() {
        let err = load_str("id,message\n1,help\n2\n").unwrap_err();
        match err {
            ReadError::Malformed { line, .. } => assert!(line.is_some()),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_header_only_is_empty() {
        assert!(matches!(load_str("id,message\n"), Err(ReadError::Empty(_))));
        assert!(matches!(load_str(""), Err(ReadError::Empty(_))));
    }

    #[test]
    fn test_duplicate_header() {
        let err = load_str("id,id\n1,2\n").unwrap_err();
        assert!(matches!(err, ReadError::DuplicateHeader { ref column, .. } if column == "id"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_table(Path::new("/nonexistent/messages.csv"), &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, ReadError::NotFound(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "id,categories").unwrap();
        writeln!(file, "1,related-1;request-0").unwrap();
        file.flush().unwrap();

        let table = load_table(file.path(), &LoadOptions::default()).unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.rows()[0][1], Value::from("related-1;request-0"));
    }
}

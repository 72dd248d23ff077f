//! Table model

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::value::{SqlType, Value};
use crate::error::SchemaMismatchError;

/// In-memory table of named columns and rows of values
///
/// Column names are unique and every row holds exactly one value per column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create a table, checking column uniqueness and row widths
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, SchemaMismatchError> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(SchemaMismatchError::DuplicateColumn {
                    column: column.clone(),
                });
            }
        }

        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(SchemaMismatchError::RowWidth {
                    row: i + 1,
                    expected: columns.len(),
                    actual: row.len(),
                });
            }
        }

        Ok(Self { columns, rows })
    }

    /// Create a table with no rows
    pub fn empty(columns: Vec<String>) -> Result<Self, SchemaMismatchError> {
        Self::new(columns, Vec::new())
    }

    /// Column names, in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows, in order
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Get a single row
    pub fn row(&self, index: usize) -> Option<&[Value]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Check whether a column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Iterate over the values of one column
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| &row[index])
    }

    /// Storage type for a column: `BigInt` when every non-null value is an integer
    ///
    /// All-null columns are `Text`.
    pub fn sql_type(&self, index: usize) -> SqlType {
        let mut saw_integer = false;
        for value in self.column_values(index) {
            match value {
                Value::Null => {}
                Value::Integer(_) => saw_integer = true,
                Value::Text(_) => return SqlType::Text,
            }
        }
        if saw_integer {
            SqlType::BigInt
        } else {
            SqlType::Text
        }
    }

    /// Storage types for every column
    pub fn sql_types(&self) -> Vec<SqlType> {
        (0..self.columns.len()).map(|i| self.sql_type(i)).collect()
    }

    /// Copy of the table keeping only rows for which `keep` returns true
    pub fn filter_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&[Value]) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| keep(row.as_slice()))
                .cloned()
                .collect(),
        }
    }

    /// Decompose into column names and rows
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Value>>) {
        (self.columns, self.rows)
    }
}

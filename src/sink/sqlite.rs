//! SQLite sink implementation
//!
//! Writes the cleaned table into a SQLite database file, the format most
//! downstream tooling for this dataset expects.

use std::path::{Path, PathBuf};

use super::{OverwriteSql, TableSink, WriteError, WriteResult, quote_identifier};
use crate::models::{SqlType, Table, Value};

/// SQLite sink
pub struct SqliteSink {
    /// Path to the database file (None for in-memory)
    db_path: Option<PathBuf>,
    connection: rusqlite::Connection,
}

impl SqliteSink {
    /// Open (or create) a SQLite database file
    ///
    /// Missing parent directories are created.
    pub fn new(db_path: impl AsRef<Path>) -> WriteResult<Self> {
        let path = db_path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                WriteError::ConnectionFailed(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let connection = rusqlite::Connection::open(&path).map_err(|e| {
            WriteError::ConnectionFailed(format!("Failed to open SQLite: {}", e))
        })?;

        Ok(Self {
            db_path: Some(path),
            connection,
        })
    }

    /// Create an in-memory SQLite sink
    pub fn in_memory() -> WriteResult<Self> {
        let connection = rusqlite::Connection::open_in_memory().map_err(|e| {
            WriteError::ConnectionFailed(format!("Failed to create in-memory SQLite: {}", e))
        })?;

        Ok(Self {
            db_path: None,
            connection,
        })
    }

    /// Get the database file path (None for in-memory)
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Read a whole table back, in insertion order
    pub fn read_table(&self, table_name: &str) -> WriteResult<Table> {
        let sql = format!("SELECT * FROM {} ORDER BY rowid", quote_identifier(table_name));
        let mut stmt = self
            .connection
            .prepare(&sql)
            .map_err(|e| WriteError::QueryFailed(format!("Prepare failed: {}", e)))?;

        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let column_count = columns.len();

        let mut result_rows = stmt
            .query([])
            .map_err(|e| WriteError::QueryFailed(format!("Query failed: {}", e)))?;

        let mut rows = Vec::new();
        while let Some(row) = result_rows
            .next()
            .map_err(|e| WriteError::QueryFailed(format!("Row fetch error: {}", e)))?
        {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                let value: rusqlite::types::Value = row
                    .get(i)
                    .map_err(|e| WriteError::QueryFailed(format!("Column {}: {}", i, e)))?;
                values.push(Self::from_sqlite(value));
            }
            rows.push(values);
        }

        Table::new(columns, rows).map_err(|e| WriteError::QueryFailed(e.to_string()))
    }

    fn to_sqlite(value: &Value, sql_type: SqlType) -> rusqlite::types::Value {
        match (value, sql_type) {
            (Value::Null, _) => rusqlite::types::Value::Null,
            (Value::Integer(n), SqlType::BigInt) => rusqlite::types::Value::Integer(*n),
            (Value::Integer(n), SqlType::Text) => rusqlite::types::Value::Text(n.to_string()),
            (Value::Text(s), _) => rusqlite::types::Value::Text(s.clone()),
        }
    }

    fn from_sqlite(value: rusqlite::types::Value) -> Value {
        use rusqlite::types::Value as Db;

        match value {
            Db::Null => Value::Null,
            Db::Integer(i) => Value::Integer(i),
            Db::Real(f) => Value::Text(f.to_string()),
            Db::Text(s) => Value::Text(s),
            Db::Blob(b) => Value::Text(String::from_utf8_lossy(&b).into_owned()),
        }
    }
}

impl TableSink for SqliteSink {
    fn write_table(&mut self, table_name: &str, table: &Table) -> WriteResult<usize> {
        let sql = OverwriteSql::build(table_name, table, |_| "?".to_string())?;

        let tx = self
            .connection
            .transaction()
            .map_err(|e| WriteError::WriteFailed(format!("Failed to begin transaction: {}", e)))?;

        tx.execute_batch(&sql.replace).map_err(|e| {
            WriteError::WriteFailed(format!("Failed to create table {}: {}", table_name, e))
        })?;

        {
            let mut stmt = tx
                .prepare(&sql.insert)
                .map_err(|e| WriteError::WriteFailed(format!("Prepare failed: {}", e)))?;

            for (i, row) in table.rows().iter().enumerate() {
                let params = row
                    .iter()
                    .zip(&sql.types)
                    .map(|(value, sql_type)| Self::to_sqlite(value, *sql_type));
                stmt.execute(rusqlite::params_from_iter(params)).map_err(|e| {
                    WriteError::WriteFailed(format!("Insert of row {} failed: {}", i + 1, e))
                })?;
            }
        }

        tx.commit()
            .map_err(|e| WriteError::WriteFailed(format!("Commit failed: {}", e)))?;

        tracing::info!(
            table = table_name,
            rows = table.row_count(),
            path = ?self.db_path,
            "Wrote table to SQLite"
        );
        Ok(table.row_count())
    }
}

//! DuckDB sink implementation
//!
//! Writes the cleaned table into an embedded DuckDB database, either file
//! based or in-memory.

use std::path::{Path, PathBuf};

use super::{OverwriteSql, TableSink, WriteError, WriteResult, quote_identifier};
use crate::models::{SqlType, Table, Value};

/// DuckDB sink
///
/// Owns a single connection; writes are wrapped in one transaction each.
pub struct DuckDbSink {
    /// Path to the database file (None for in-memory)
    db_path: Option<PathBuf>,
    connection: duckdb::Connection,
}

impl DuckDbSink {
    /// Open (or create) a file-based DuckDB database
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

        let connection = duckdb::Connection::open(&path).map_err(|e| {
            WriteError::ConnectionFailed(format!("Failed to open DuckDB: {}", e))
        })?;

        Ok(Self {
            db_path: Some(path),
            connection,
        })
    }

    /// Create an in-memory DuckDB sink
    pub fn in_memory() -> WriteResult<Self> {
        let connection = duckdb::Connection::open_in_memory().map_err(|e| {
            WriteError::ConnectionFailed(format!("Failed to create in-memory DuckDB: {}", e))
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

    /// Check if this is an in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.db_path.is_none()
    }

    /// Read a whole table back, in insertion order
    pub fn read_table(&self, table_name: &str) -> WriteResult<Table> {
        let sql = format!("SELECT * FROM {}", quote_identifier(table_name));
        let mut stmt = self
            .connection
            .prepare(&sql)
            .map_err(|e| WriteError::QueryFailed(format!("Prepare failed: {}", e)))?;

        // In DuckDB 1.4+, we need to execute the query first, then get columns
        let mut result_rows = stmt
            .query([])
            .map_err(|e| WriteError::QueryFailed(format!("Query failed: {}", e)))?;

        let column_count = result_rows.as_ref().map(|r| r.column_count()).unwrap_or(0);
        let columns: Vec<String> = (0..column_count)
            .map(|i| {
                result_rows
                    .as_ref()
                    .and_then(|r| r.column_name(i).ok())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("col{}", i))
            })
            .collect();

        let mut rows = Vec::new();
        while let Some(row) = result_rows
            .next()
            .map_err(|e| WriteError::QueryFailed(format!("Row fetch error: {}", e)))?
        {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                let value: duckdb::types::Value = row
                    .get(i)
                    .map_err(|e| WriteError::QueryFailed(format!("Column {}: {}", i, e)))?;
                values.push(Self::from_duckdb(value));
            }
            rows.push(values);
        }

        Table::new(columns, rows).map_err(|e| WriteError::QueryFailed(e.to_string()))
    }

    /// Convert a cell into a DuckDB parameter for a column of `sql_type`
    fn to_duckdb(value: &Value, sql_type: SqlType) -> duckdb::types::Value {
        match (value, sql_type) {
            (Value::Null, _) => duckdb::types::Value::Null,
            (Value::Integer(n), SqlType::BigInt) => duckdb::types::Value::BigInt(*n),
            (Value::Integer(n), SqlType::Text) => duckdb::types::Value::Text(n.to_string()),
            (Value::Text(s), _) => duckdb::types::Value::Text(s.clone()),
        }
    }

    /// Convert a DuckDB value read back from a table
    fn from_duckdb(value: duckdb::types::Value) -> Value {
        use duckdb::types::Value as Db;

        match value {
            Db::Null => Value::Null,
            Db::Boolean(b) => Value::Integer(b as i64),
            Db::TinyInt(i) => Value::Integer(i.into()),
            Db::SmallInt(i) => Value::Integer(i.into()),
            Db::Int(i) => Value::Integer(i.into()),
            Db::BigInt(i) => Value::Integer(i),
            Db::HugeInt(i) => i64::try_from(i)
                .map(Value::Integer)
                .unwrap_or_else(|_| Value::Text(i.to_string())),
            Db::UTinyInt(i) => Value::Integer(i.into()),
            Db::USmallInt(i) => Value::Integer(i.into()),
            Db::UInt(i) => Value::Integer(i.into()),
            Db::Text(s) => Value::Text(s),
            other => Value::Text(format!("{:?}", other)),
        }
    }
}

impl TableSink for DuckDbSink {
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
                    .map(|(value, sql_type)| Self::to_duckdb(value, *sql_type));
                stmt.execute(duckdb::params_from_iter(params)).map_err(|e| {
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
            "Wrote table to DuckDB"
        );
        Ok(table.row_count())
    }
}

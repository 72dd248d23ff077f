//! PostgreSQL sink implementation
//!
//! The async client is driven by a private current-thread runtime so the
//! sink stays synchronous like the rest of the pipeline.

use tokio_postgres::types::ToSql;

use super::{OverwriteSql, TableSink, WriteError, WriteResult, mask_password};
use crate::models::{SqlType, Table, Value};

/// PostgreSQL sink
pub struct PostgresSink {
    /// Connection string
    connection_string: String,
    runtime: tokio::runtime::Runtime,
    client: tokio_postgres::Client,
}

impl PostgresSink {
    /// Connect to a PostgreSQL server
    ///
    /// # Arguments
    /// * `connection_string` - PostgreSQL connection string
    pub fn new(connection_string: &str) -> WriteResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| WriteError::ConnectionFailed(format!("Failed to create runtime: {}", e)))?;

        let (client, connection) = runtime
            .block_on(tokio_postgres::connect(
                connection_string,
                tokio_postgres::NoTls,
            ))
            .map_err(|e| {
                WriteError::ConnectionFailed(format!("Failed to connect to PostgreSQL: {}", e))
            })?;

        // Connection handler; only makes progress inside block_on
        runtime.spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL connection error: {}", e);
            }
        });

        Ok(Self {
            connection_string: connection_string.to_string(),
            runtime,
            client,
        })
    }

    /// Get the connection string (masked for security)
    pub fn connection_string_masked(&self) -> String {
        mask_password(&self.connection_string)
    }

    fn to_param(value: &Value, sql_type: SqlType) -> Box<dyn ToSql + Sync + Send> {
        match sql_type {
            SqlType::BigInt => Box::new(value.as_integer()),
            SqlType::Text => Box::new(match value {
                Value::Null => None,
                other => Some(other.to_string()),
            }),
        }
    }
}

impl TableSink for PostgresSink {
    fn write_table(&mut self, table_name: &str, table: &Table) -> WriteResult<usize> {
        let sql = OverwriteSql::build(table_name, table, |i| format!("${}", i))?;
        let client = &mut self.client;

        self.runtime.block_on(async move {
            let tx = client.transaction().await.map_err(|e| {
                WriteError::WriteFailed(format!("Failed to begin transaction: {}", e))
            })?;

            tx.batch_execute(&sql.replace).await.map_err(|e| {
                WriteError::WriteFailed(format!("Failed to create table {}: {}", table_name, e))
            })?;

            let stmt = tx
                .prepare(&sql.insert)
                .await
                .map_err(|e| WriteError::WriteFailed(format!("Prepare failed: {}", e)))?;

            for (i, row) in table.rows().iter().enumerate() {
                let params: Vec<Box<dyn ToSql + Sync + Send>> = row
                    .iter()
                    .zip(&sql.types)
                    .map(|(value, sql_type)| Self::to_param(value, *sql_type))
                    .collect();
                let param_refs: Vec<&(dyn ToSql + Sync)> = params
                    .iter()
                    .map(|p| p.as_ref() as &(dyn ToSql + Sync))
                    .collect();

                tx.execute(&stmt, &param_refs).await.map_err(|e| {
                    WriteError::WriteFailed(format!("Insert of row {} failed: {}", i + 1, e))
                })?;
            }

            tx.commit()
                .await
                .map_err(|e| WriteError::WriteFailed(format!("Commit failed: {}", e)))
        })?;

        tracing::info!(
            table = table_name,
            rows = table.row_count(),
            destination = %self.connection_string_masked(),
            "Wrote table to PostgreSQL"
        );
        Ok(table.row_count())
    }
}

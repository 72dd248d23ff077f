//! Joining messages with decoded labels
//!
//! The default strategy joins on an explicit key column. Positional joining
//! is kept for inputs without a shared key, but only after asserting that
//! both tables line up.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::SchemaMismatchError;
use crate::models::{Table, Value};

/// Default join key column
pub const DEFAULT_KEY_COLUMN: &str = "id";

/// How message rows are paired with label rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum JoinStrategy {
    /// Pair rows by the value of a key column present in both tables
    Keyed { key: String },
    /// Pair rows by position; row counts must be equal
    Positional,
}

impl Default for JoinStrategy {
    fn default() -> Self {
        JoinStrategy::Keyed {
            key: DEFAULT_KEY_COLUMN.to_string(),
        }
    }
}

impl std::fmt::Display for JoinStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinStrategy::Keyed { key } => write!(f, "keyed on '{}'", key),
            JoinStrategy::Positional => write!(f, "positional"),
        }
    }
}

/// Join `messages` with `labels`
///
/// Message columns come first and message row order is preserved. A keyed
/// join whose key column is absent from `labels` falls back to the checked
/// positional join.
pub fn merge_tables(
    messages: &Table,
    labels: &Table,
    strategy: &JoinStrategy,
) -> Result<Table, SchemaMismatchError> {
    let merged = match strategy {
        JoinStrategy::Keyed { key } if !labels.has_column(key) => {
            tracing::warn!(
                key = %key,
                "Categories table has no key column, joining by position"
            );
            merge_positional(messages, labels)?
        }
        JoinStrategy::Keyed { key } => merge_keyed(messages, labels, key)?,
        JoinStrategy::Positional => merge_positional(messages, labels)?,
    };

    tracing::info!(
        rows = merged.row_count(),
        columns = merged.column_count(),
        strategy = %strategy,
        "Merged messages with labels"
    );
    Ok(merged)
}

/// Keyed join
///
/// Keys are compared by their input text, so `3` never pairs with `03` and a
/// numeric key can match a text column holding the same digits. Repeated
/// keys are paired by occurrence: the k-th message with a key takes the k-th
/// label row with the same key. Null keys never match. Every row on both
/// sides must find a partner, so the row count is preserved.
fn merge_keyed(messages: &Table, labels: &Table, key: &str) -> Result<Table, SchemaMismatchError> {
    let message_key = messages
        .column_index(key)
        .ok_or_else(|| SchemaMismatchError::MissingKey {
            table: "messages",
            column: key.to_string(),
        })?;
    let label_key = labels
        .column_index(key)
        .ok_or_else(|| SchemaMismatchError::MissingKey {
            table: "categories",
            column: key.to_string(),
        })?;

    let label_columns: Vec<usize> = (0..labels.column_count())
        .filter(|&i| i != label_key)
        .collect();
    for &i in &label_columns {
        let name = &labels.columns()[i];
        if messages.has_column(name) {
            return Err(SchemaMismatchError::ColumnCollision {
                column: name.clone(),
            });
        }
    }

    let mut by_key: HashMap<String, VecDeque<usize>> = HashMap::new();
    let mut unkeyed: Vec<usize> = Vec::new();
    for (i, row) in labels.rows().iter().enumerate() {
        match &row[label_key] {
            Value::Null => unkeyed.push(i),
            value => by_key.entry(value.to_string()).or_default().push_back(i),
        }
    }

    let mut rows = Vec::with_capacity(messages.row_count());
    for row in messages.rows() {
        let key_value = &row[message_key];
        let partner = match key_value {
            Value::Null => None,
            value => by_key
                .get_mut(&value.to_string())
                .and_then(VecDeque::pop_front),
        };
        let label_row = partner.ok_or_else(|| SchemaMismatchError::UnmatchedKey {
            table: "messages",
            key: display_key(key_value),
        })?;

        let mut out = row.clone();
        out.extend(
            label_columns
                .iter()
                .map(|&i| labels.rows()[label_row][i].clone()),
        );
        rows.push(out);
    }

    // Leftover label rows have no message partner
    if let Some(first) = by_key
        .values()
        .flat_map(|pending| pending.iter().copied())
        .chain(unkeyed)
        .min()
    {
        return Err(SchemaMismatchError::UnmatchedKey {
            table: "categories",
            key: display_key(&labels.rows()[first][label_key]),
        });
    }

    let mut columns = messages.columns().to_vec();
    columns.extend(label_columns.iter().map(|&i| labels.columns()[i].clone()));
    Table::new(columns, rows)
}

/// Positional join with alignment checks
///
/// Columns present in both tables must agree row by row and are emitted once.
fn merge_positional(messages: &Table, labels: &Table) -> Result<Table, SchemaMismatchError> {
    if messages.row_count() != labels.row_count() {
        return Err(SchemaMismatchError::RowCountMismatch {
            messages: messages.row_count(),
            categories: labels.row_count(),
        });
    }

    let mut shared: Vec<(usize, usize)> = Vec::new();
    let mut label_only: Vec<usize> = Vec::new();
    for (i, name) in labels.columns().iter().enumerate() {
        match messages.column_index(name) {
            Some(m) => shared.push((m, i)),
            None => label_only.push(i),
        }
    }

    let mut rows = Vec::with_capacity(messages.row_count());
    for (n, (message_row, label_row)) in messages.rows().iter().zip(labels.rows()).enumerate() {
        for &(m, l) in &shared {
            if message_row[m] != label_row[l] {
                return Err(SchemaMismatchError::Misaligned {
                    row: n + 1,
                    column: messages.columns()[m].clone(),
                });
            }
        }

        let mut out = message_row.clone();
        out.extend(label_only.iter().map(|&i| label_row[i].clone()));
        rows.push(out);
    }

    let mut columns = messages.columns().to_vec();
    columns.extend(label_only.iter().map(|&i| labels.columns()[i].clone()));
    Table::new(columns, rows)
}

fn display_key(value: &Value) -> String {
    match value {
        Value::Null => "<null>".to_string(),
        Value::Integer(n) => n.to_string(),
        Value::Text(s) => format!("'{}'", s),
    }
}

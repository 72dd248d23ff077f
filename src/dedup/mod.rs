//! Exact-duplicate row removal

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use crate::models::{Table, Value};

/// Result of deduplicating a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupOutcome {
    /// Table with duplicates removed, first occurrences kept in order
    pub table: Table,
    /// Number of rows removed
    pub removed: usize,
}

/// Fingerprint a row over every column
///
/// Each value is tagged with its type and length-prefixed so that distinct
/// rows never share an encoding.
fn row_fingerprint(row: &[Value]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for value in row {
        match value {
            Value::Null => hasher.update([0u8]),
            Value::Integer(n) => {
                hasher.update([1u8]);
                hasher.update(n.to_le_bytes());
            }
            Value::Text(s) => {
                hasher.update([2u8]);
                hasher.update((s.len() as u64).to_le_bytes());
                hasher.update(s.as_bytes());
            }
        }
    }
    hasher.finalize().into()
}

/// Remove rows that exactly duplicate an earlier row
pub fn deduplicate(table: &Table) -> DedupOutcome {
    let mut seen: HashSet<[u8; 32]> = HashSet::with_capacity(table.row_count());
    let deduped = table.filter_rows(|row| seen.insert(row_fingerprint(row)));

    let removed = table.row_count() - deduped.row_count();
    tracing::info!(
        removed,
        remaining = deduped.row_count(),
        "Removed duplicate rows"
    );

    DedupOutcome {
        table: deduped,
        removed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: Vec<Vec<Value>>) -> Table {
        Table::new(vec!["id".to_string(), "text".to_string()], rows).unwrap()
    }

    #[test]
    fn test_removes_exact_duplicates_keeping_first() {
        let input = table(vec![
            vec![Value::Integer(1), Value::from("help")],
            vec![Value::Integer(2), Value::from("food")],
            vec![Value::Integer(1), Value::from("help")],
            vec![Value::Integer(1), Value::from("help ")],
        ]);
        let outcome = deduplicate(&input);
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.table.row_count(), 3);
        assert_eq!(outcome.table.rows()[2][1], Value::from("help "));
    }

    #[test]
    fn test_type_distinguishes_rows() {
        let input = table(vec![
            vec![Value::Integer(1), Value::Null],
            vec![Value::from("1"), Value::Null],
            vec![Value::Integer(1), Value::from("")],
        ]);
        assert_eq!(deduplicate(&input).removed, 0);
    }

    #[test]
    fn test_adjacent_text_boundaries() {
        let input = table(vec![
            vec![Value::from("ab"), Value::from("c")],
            vec![Value::from("a"), Value::from("bc")],
        ]);
        assert_eq!(deduplicate(&input).removed, 0);
    }

    #[test]
    fn test_idempotent() {
        let input = table(vec![
            vec![Value::Integer(1), Value::from("a")],
            vec![Value::Integer(1), Value::from("a")],
            vec![Value::Integer(2), Value::from("b")],
        ]);
        let first = deduplicate(&input);
        let second = deduplicate(&first.table);
        assert_eq!(first.removed, 1);
        assert_eq!(second.removed, 0);
        assert_eq!(second.table, first.table);
    }
}

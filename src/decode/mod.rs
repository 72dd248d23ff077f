//! Category label decoding
//!
//! Turns the compound label column of the category table into one integer
//! column per category. The schema is inferred from the first row and every
//! other row is validated against it; nothing is silently padded, truncated
//! or stripped.

pub mod schema;

pub use schema::{CategorySchema, NamePolicy, parse_segment, split_segments};

use serde::{Deserialize, Serialize};

use crate::error::SchemaMismatchError;
use crate::merge::DEFAULT_KEY_COLUMN;
use crate::models::{Table, Value};

/// Default name of the compound label column
pub const DEFAULT_CATEGORY_COLUMN: &str = "categories";

/// How flag values are checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagPolicy {
    /// Only 0 and 1 are accepted
    #[default]
    Binary,
    /// Values above 1 become 1
    Clamp,
    /// Any unsigned integer is kept as-is
    Raw,
}

impl FlagPolicy {
    fn apply(&self, value: i64) -> Option<i64> {
        match self {
            FlagPolicy::Binary => (value <= 1).then_some(value),
            FlagPolicy::Clamp => Some(value.min(1)),
            FlagPolicy::Raw => Some(value),
        }
    }
}

impl std::str::FromStr for FlagPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "binary" => Ok(FlagPolicy::Binary),
            "clamp" => Ok(FlagPolicy::Clamp),
            "raw" => Ok(FlagPolicy::Raw),
            _ => Err(format!(
                "Unknown flag policy: {}. Use 'binary', 'clamp' or 'raw'.",
                s
            )),
        }
    }
}

impl std::fmt::Display for FlagPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlagPolicy::Binary => write!(f, "binary"),
            FlagPolicy::Clamp => write!(f, "clamp"),
            FlagPolicy::Raw => write!(f, "raw"),
        }
    }
}

/// Options for decoding the label table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeOptions {
    /// Name of the compound label column
    pub column: String,
    /// How category names are derived
    pub name_policy: NamePolicy,
    /// How flag values are checked
    pub flag_policy: FlagPolicy,
    /// Columns that are never category columns, such as the join key
    pub key_columns: Vec<String>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            column: DEFAULT_CATEGORY_COLUMN.to_string(),
            name_policy: NamePolicy::default(),
            flag_policy: FlagPolicy::default(),
            key_columns: vec![DEFAULT_KEY_COLUMN.to_string()],
        }
    }
}

/// Decoded label table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLabels {
    /// Inferred category schema
    pub schema: CategorySchema,
    /// Passthrough columns followed by one integer column per category
    pub table: Table,
    /// Number of flags changed by [`FlagPolicy::Clamp`]
    pub clamped: usize,
}

/// Parse a flag strictly: one or more ASCII digits, nothing else
fn parse_flag(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<i64>().ok()
}

fn compound_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Infer the category schema from the first row of a label table
pub fn infer_schema(
    table: &Table,
    options: &DecodeOptions,
) -> Result<CategorySchema, SchemaMismatchError> {
    let column = table
        .column_index(&options.column)
        .ok_or_else(|| SchemaMismatchError::MissingColumn {
            column: options.column.clone(),
        })?;
    let first = table.row(0).ok_or(SchemaMismatchError::NoRows)?;
    CategorySchema::infer(&compound_text(&first[column]), options.name_policy)
}

/// Decode the compound label column of `table`
///
/// A table without the compound column whose trailing columns already hold
/// valid integer flags is treated as decoded and returned unchanged.
pub fn decode_labels(
    table: &Table,
    options: &DecodeOptions,
) -> Result<DecodedLabels, SchemaMismatchError> {
    let Some(column) = table.column_index(&options.column) else {
        return already_decoded(table, options).ok_or_else(|| SchemaMismatchError::MissingColumn {
            column: options.column.clone(),
        });
    };

    let schema = infer_schema(table, options)?;
    tracing::debug!(categories = ?schema.names(), "Inferred category schema");

    let mut columns: Vec<String> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != column)
        .map(|(_, name)| name.clone())
        .collect();
    columns.extend(schema.names().iter().cloned());

    let mut clamped = 0;
    let mut rows = Vec::with_capacity(table.row_count());

    for (i, row) in table.rows().iter().enumerate() {
        let row_number = i + 1;
        let compound = compound_text(&row[column]);
        let segments = split_segments(&compound);

        if segments.len() != schema.len() {
            return Err(SchemaMismatchError::SegmentCount {
                row: row_number,
                expected: schema.len(),
                actual: segments.len(),
            });
        }

        let mut out: Vec<Value> = row
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != column)
            .map(|(_, v)| v.clone())
            .collect();

        for (position, (raw, expected)) in segments.iter().zip(schema.names()).enumerate() {
            let segment = parse_segment(raw, options.name_policy, row_number)?;
            if &segment.name != expected {
                return Err(SchemaMismatchError::CategoryMismatch {
                    row: row_number,
                    position: position + 1,
                    expected: expected.clone(),
                    actual: segment.name,
                });
            }

            let invalid = || SchemaMismatchError::InvalidFlag {
                row: row_number,
                category: expected.clone(),
                value: segment.flag.to_string(),
            };
            let parsed = parse_flag(segment.flag).ok_or_else(invalid)?;
            let value = options.flag_policy.apply(parsed).ok_or_else(invalid)?;
            if value != parsed {
                clamped += 1;
            }
            out.push(Value::Integer(value));
        }

        rows.push(out);
    }

    if clamped > 0 {
        tracing::warn!(clamped, "Clamped category flags above 1");
    }

    let table = Table::new(columns, rows)?;
    tracing::info!(
        rows = table.row_count(),
        categories = schema.len(),
        "Decoded category labels"
    );

    Ok(DecodedLabels {
        schema,
        table,
        clamped,
    })
}

/// Recognise a table previously produced by [`decode_labels`]
///
/// The category columns are the longest suffix of non-key columns whose
/// every value is an integer accepted unchanged by the flag policy.
fn already_decoded(table: &Table, options: &DecodeOptions) -> Option<DecodedLabels> {
    if table.is_empty() {
        return None;
    }

    let is_flag_column = |index: usize| {
        table.column_values(index).all(|v| {
            v.as_integer()
                .is_some_and(|n| n >= 0 && options.flag_policy.apply(n) == Some(n))
        })
    };

    let start = (0..table.column_count())
        .rev()
        .take_while(|&i| {
            !options.key_columns.contains(&table.columns()[i]) && is_flag_column(i)
        })
        .last()?;

    let schema = CategorySchema::new(table.columns()[start..].to_vec()).ok()?;
    tracing::debug!(categories = schema.len(), "Label table already decoded");

    Some(DecodedLabels {
        schema,
        table: table.clone(),
        clamped: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label_table(labels: &[&str]) -> Table {
        Table::new(
            vec!["id".to_string(), "categories".to_string()],
            labels
                .iter()
                .enumerate()
                .map(|(i, l)| vec![Value::Integer(i as i64 + 1), Value::from(*l)])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_decode_single_row() {
        let decoded = decode_labels(
            &label_table(&["related-0;request-1;offer-0"]),
            &DecodeOptions::default(),
        )
        .unwrap();

        assert_eq!(decoded.schema.names(), &["related", "request", "offer"]);
        assert_eq!(decoded.table.columns(), &["id", "related", "request", "offer"]);
        assert_eq!(
            decoded.table.rows()[0],
            vec![
                Value::Integer(1),
                Value::Integer(0),
                Value::Integer(1),
                Value::Integer(0)
            ]
        );
    }

    #[test]
    fn test_segment_count_mismatch() {
        let err = decode_labels(
            &label_table(&["related-1;request-0;offer-0", "related-0;request-1"]),
            &DecodeOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            SchemaMismatchError::SegmentCount {
                row: 2,
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_category_order_mismatch() {
        let err = decode_labels(
            &label_table(&["related-1;request-0", "request-0;related-1"]),
            &DecodeOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SchemaMismatchError::CategoryMismatch { row: 2, position: 1, .. }
        ));
    }

    #[test]
    fn test_non_numeric_flag_is_rejected() {
        let err = decode_labels(&label_table(&["related-1x"]), &DecodeOptions::default())
            .unwrap_err();
        assert_eq!(
            err,
            SchemaMismatchError::InvalidFlag {
                row: 1,
                category: "related".to_string(),
                value: "1x".to_string()
            }
        );
    }

    #[test]
    fn test_flag_policies() {
        let table = label_table(&["related-2;request-0"]);

        let err = decode_labels(&table, &DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, SchemaMismatchError::InvalidFlag { .. }));

        let clamp = DecodeOptions {
            flag_policy: FlagPolicy::Clamp,
            ..Default::default()
        };
        let decoded = decode_labels(&table, &clamp).unwrap();
        assert_eq!(decoded.table.rows()[0][1], Value::Integer(1));
        assert_eq!(decoded.clamped, 1);

        let raw = DecodeOptions {
            flag_policy: FlagPolicy::Raw,
            ..Default::default()
        };
        let decoded = decode_labels(&table, &raw).unwrap();
        assert_eq!(decoded.table.rows()[0][1], Value::Integer(2));
        assert_eq!(decoded.clamped, 0);
    }

    #[test]
    fn test_empty_label_is_segment_mismatch() {
        let table = Table::new(
            vec!["id".to_string(), "categories".to_string()],
            vec![
                vec![Value::Integer(1), Value::from("related-1")],
                vec![Value::Integer(2), Value::Null],
            ],
        )
        .unwrap();
        let err = decode_labels(&table, &DecodeOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            SchemaMismatchError::SegmentCount { row: 2, actual: 0, .. }
        ));
    }

    #[test]
    fn test_decode_is_idempotent() {
        let first = decode_labels(
            &label_table(&["related-1;request-0", "related-0;request-1"]),
            &DecodeOptions::default(),
        )
        .unwrap();
        let second = decode_labels(&first.table, &DecodeOptions::default()).unwrap();
        assert_eq!(second.table, first.table);
        assert_eq!(second.clamped, 0);
    }

    #[test]
    fn test_redecode_keeps_key_out_of_schema() {
        let raw = DecodeOptions {
            flag_policy: FlagPolicy::Raw,
            ..Default::default()
        };
        let first = decode_labels(&label_table(&["related-1"]), &raw).unwrap();
        assert_eq!(first.table.columns(), &["id", "related"]);

        let second = decode_labels(&first.table, &raw).unwrap();
        assert_eq!(second.schema.names(), &["related"]);
        assert_eq!(second.table, first.table);
    }

    #[test]
    fn test_missing_column() {
        let table = Table::new(
            vec!["id".to_string(), "text".to_string()],
            vec![vec![Value::Integer(1), Value::from("x")]],
        )
        .unwrap();
        let err = decode_labels(&table, &DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, SchemaMismatchError::MissingColumn { .. }));
    }

    #[test]
    fn test_category_colliding_with_passthrough_column() {
        let err = decode_labels(&label_table(&["id-1"]), &DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, SchemaMismatchError::DuplicateColumn { .. }));
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("0"), Some(0));
        assert_eq!(parse_flag("01"), Some(1));
        assert_eq!(parse_flag(""), None);
        assert_eq!(parse_flag("+1"), None);
        assert_eq!(parse_flag(" 1"), None);
    }
}

//! Cell value model

use serde::{Deserialize, Serialize};

/// A single cell of a [`Table`](super::Table)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Empty field
    Null,
    /// Signed 64-bit integer
    Integer(i64),
    /// Free text
    Text(String),
}

impl Value {
    /// Infer a value from a raw delimited-text field
    ///
    /// Empty fields become `Null`, canonical integers become `Integer`,
    /// everything else is kept verbatim as `Text`.
    pub fn infer(raw: &str) -> Self {
        if raw.is_empty() {
            Value::Null
        } else if let Some(n) = Self::parse_canonical_integer(raw) {
            Value::Integer(n)
        } else {
            Value::Text(raw.to_string())
        }
    }

    /// Parse `raw` as an `i64` only if printing it back gives the same text
    ///
    /// `007`, `+5` and `-0` are rejected so the original text is never lost.
    pub fn parse_canonical_integer(raw: &str) -> Option<i64> {
        raw.parse::<i64>().ok().filter(|n| n.to_string() == raw)
    }

    /// Check whether the value is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the integer payload, if any
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the text payload, if any
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// Storage type of a column when written to a relational store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SqlType {
    /// Every non-null value is an integer
    BigInt,
    /// Anything else
    Text,
}

impl SqlType {
    /// SQL type name used in `CREATE TABLE`
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::BigInt => "BIGINT",
            SqlType::Text => "TEXT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer() {
        assert_eq!(Value::infer(""), Value::Null);
        assert_eq!(Value::infer("42"), Value::Integer(42));
        assert_eq!(Value::infer("-7"), Value::Integer(-7));
        assert_eq!(Value::infer("4.2"), Value::Text("4.2".to_string()));
        assert_eq!(Value::infer(" 1"), Value::Text(" 1".to_string()));
        assert_eq!(Value::infer("007"), Value::Text("007".to_string()));
        assert_eq!(Value::infer("+5"), Value::Text("+5".to_string()));
        assert_eq!(Value::infer("-0"), Value::Text("-0".to_string()));
        assert_eq!(Value::infer("help"), Value::Text("help".to_string()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Integer(3).to_string(), "3");
        assert_eq!(Value::from("food").to_string(), "food");
    }
}

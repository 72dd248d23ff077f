//! Category schema inference
//!
//! A compound label looks like `related-1;request-0;offer-0`. Each segment is
//! split at its last `-` into a category name and a flag.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::SchemaMismatchError;

/// Separator between segments of a compound label
pub const SEGMENT_SEPARATOR: char = ';';

/// Separator between a category name and its flag
pub const FLAG_SEPARATOR: char = '-';

/// How category names are derived from segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamePolicy {
    /// Everything before the last `-`, unchanged (`category2-name-1` → `category2-name`)
    #[default]
    Verbatim,
    /// Remove every digit and `-` from the whole segment (`category2-name-1` → `categoryname`)
    StripDigits,
}

impl std::str::FromStr for NamePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "verbatim" => Ok(NamePolicy::Verbatim),
            "strip-digits" | "strip_digits" => Ok(NamePolicy::StripDigits),
            _ => Err(format!(
                "Unknown name policy: {}. Use 'verbatim' or 'strip-digits'.",
                s
            )),
        }
    }
}

impl std::fmt::Display for NamePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NamePolicy::Verbatim => write!(f, "verbatim"),
            NamePolicy::StripDigits => write!(f, "strip-digits"),
        }
    }
}

/// One parsed `name-flag` segment, borrowed from the compound label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    /// Category name after applying the name policy
    pub name: String,
    /// Raw flag text after the last `-`
    pub flag: &'a str,
}

/// Split a compound label into trimmed segments
pub fn split_segments(compound: &str) -> Vec<&str> {
    if compound.trim().is_empty() {
        return Vec::new();
    }
    compound.split(SEGMENT_SEPARATOR).map(str::trim).collect()
}

/// Parse a single `name-flag` segment
///
/// `row` is only used for error reporting.
pub fn parse_segment<'a>(
    segment: &'a str,
    policy: NamePolicy,
    row: usize,
) -> Result<Segment<'a>, SchemaMismatchError> {
    let (raw_name, flag) =
        segment
            .rsplit_once(FLAG_SEPARATOR)
            .ok_or_else(|| SchemaMismatchError::InvalidSegment {
                row,
                segment: segment.to_string(),
            })?;

    let name = match policy {
        NamePolicy::Verbatim => raw_name.trim().to_string(),
        NamePolicy::StripDigits => segment
            .chars()
            .filter(|c| !c.is_ascii_digit() && *c != FLAG_SEPARATOR)
            .collect::<String>()
            .trim()
            .to_string(),
    };

    if name.is_empty() {
        return Err(SchemaMismatchError::EmptyCategoryName {
            row,
            segment: segment.to_string(),
        });
    }

    Ok(Segment { name, flag })
}

/// Ordered category names shared by every row of a label table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySchema {
    names: Vec<String>,
}

impl CategorySchema {
    /// Create a schema, rejecting repeated names
    pub fn new(names: Vec<String>) -> Result<Self, SchemaMismatchError> {
        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(SchemaMismatchError::DuplicateCategory { name: name.clone() });
            }
        }
        Ok(Self { names })
    }

    /// Infer the schema from one compound label (the first data row)
    pub fn infer(compound: &str, policy: NamePolicy) -> Result<Self, SchemaMismatchError> {
        let names = split_segments(compound)
            .into_iter()
            .map(|segment| parse_segment(segment, policy, 1).map(|s| s.name))
            .collect::<Result<Vec<_>, _>>()?;

        if names.is_empty() {
            return Err(SchemaMismatchError::SegmentCount {
                row: 1,
                expected: 1,
                actual: 0,
            });
        }

        Self::new(names)
    }

    /// Category names, in segment order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of categories
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if the schema has no categories
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

//! Flattening result sets into bounded delimited text.
//!
//! Each row becomes `name=value` pairs separated by a tab and terminated by a
//! newline. NULL renders as an empty value, so `name=` stands for both NULL
//! and the empty string. Names and values are escaped (see `escape`).
//!
//! Each serialized row has a byte budget that includes its newline. A pair
//! that would exceed it is not written, nor is any later pair of the row; the
//! row is flagged as truncated. A value is never cut in the middle.

use serde::Serialize;

use super::escape::{escape_name, escape_value};
use super::{ResultSet, Row};

pub const COLUMN_DELIMITER: char = '\t';
pub const ROW_DELIMITER: char = '\n';

/// One row in delimited form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SerializedRow {
    pub text: String,
    /// True when trailing columns were dropped to respect the budget.
    pub truncated: bool,
}

/// A result set in delimited form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SerializedResult {
    pub rows: Vec<SerializedRow>,
    /// Carried over from [`ResultSet::is_truncated`].
    pub truncated: bool,
}

impl SerializedResult {
    /// True when any row, or the row count, was cut short.
    pub fn any_truncation(&self) -> bool {
        self.truncated || self.rows.iter().any(|r| r.truncated)
    }

    /// All rows concatenated.
    pub fn to_text(&self) -> String {
        self.rows.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Serialize one row into at most `max_bytes` bytes.
pub fn serialize_row(row: &Row, max_bytes: usize) -> SerializedRow {
    // Room for the terminating newline is reserved up front.
    let budget = max_bytes.saturating_sub(ROW_DELIMITER.len_utf8());
    let mut text = String::new();
    let mut truncated = false;

    for (index, (name, value)) in row.pairs().enumerate() {
        let mut pair = String::new();
        if index > 0 {
            pair.push(COLUMN_DELIMITER);
        }
        pair.push_str(&escape_name(name));
        pair.push('=');
        if let Some(value) = value {
            pair.push_str(&escape_value(value));
        }

        if text.len() + pair.len() > budget {
            truncated = true;
            break;
        }
        text.push_str(&pair);
    }

    if max_bytes > 0 {
        text.push(ROW_DELIMITER);
    }
    SerializedRow { text, truncated }
}

/// Serialize every row of `result` with a per-row budget of `row_bytes`.
pub fn serialize_result(result: &ResultSet, row_bytes: usize) -> SerializedResult {
    SerializedResult {
        rows: result
            .rows()
            .iter()
            .map(|row| serialize_row(row, row_bytes))
            .collect(),
        truncated: result.is_truncated(),
    }
}

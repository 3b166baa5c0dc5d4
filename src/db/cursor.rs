//! Collecting native cursors into bounded result sets.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use super::DbError;

/// One result row: a text value or NULL per column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    #[serde(skip)]
    columns: Arc<[String]>,
    values: Vec<Option<String>>,
}

impl Row {
    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Value of the first column named `name`. `None` for NULL or unknown columns.
    pub fn get(&self, name: &str) -> Option<&str> {
        let index = self.columns.iter().position(|c| c == name)?;
        self.values.get(index)?.as_deref()
    }

    /// `(column name, value)` pairs in column order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Option::as_deref))
    }
}

/// Rows returned by a query, bounded by a row ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultSet {
    columns: Arc<[String]>,
    rows: Vec<Row>,
    /// True when the cursor still had rows after the ceiling was reached.
    truncated: bool,
    #[serde(skip)]
    max_rows: usize,
}

impl ResultSet {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Fail with `ResultTruncated` if rows were dropped at the ceiling.
    pub fn into_complete(self) -> Result<Self, DbError> {
        if self.truncated {
            Err(DbError::ResultTruncated {
                max_rows: self.max_rows,
            })
        } else {
            Ok(self)
        }
    }
}

/// A backend cursor positioned before its first row.
pub(crate) trait Cursor {
    /// Fetch the next row rendered as text, `None` once exhausted.
    fn next_row(&mut self) -> Result<Option<Vec<Option<String>>>, DbError>;
}

/// Step `cursor` until it is exhausted or `max_rows` rows are held.
///
/// One extra fetch past the ceiling decides the truncation flag; the cursor
/// is not drained beyond that.
pub(crate) fn collect_rows(
    columns: Vec<String>,
    cursor: &mut impl Cursor,
    max_rows: usize,
) -> Result<ResultSet, DbError> {
    let columns: Arc<[String]> = columns.into();
    let mut rows = Vec::new();
    let mut truncated = false;

    while let Some(mut values) = cursor.next_row()? {
        if rows.len() == max_rows {
            truncated = true;
            break;
        }
        values.resize(columns.len(), None);
        rows.push(Row {
            columns: Arc::clone(&columns),
            values,
        });
    }

    if truncated {
        warn!(max_rows, "result set truncated at row ceiling");
    }

    Ok(ResultSet {
        columns,
        rows,
        truncated,
        max_rows,
    })
}

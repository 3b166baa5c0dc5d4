//! Output formatting for query command results.

use super::execute::QueryResult;
use crate::output::Outputable;

impl Outputable for QueryResult {
    fn to_table(&self) -> String {
        if self.rows.is_empty() {
            return "No rows.".to_string();
        }

        let mut out = self.serialized.to_text();
        out.push_str(&match self.rows.len() {
            1 => "1 row".to_string(),
            n => format!("{} rows", n),
        });
        if self.truncated {
            out.push_str(" (truncated at row limit)");
        }
        if self.serialized.rows.iter().any(|r| r.truncated) {
            out.push_str(" (columns dropped from oversized rows)");
        }
        out
    }
}

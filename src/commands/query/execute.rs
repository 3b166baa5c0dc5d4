use std::error::Error;

use serde::Serialize;

use super::QueryCmd;
use crate::commands::{Execute, Session};
use crate::db::{serialize_result, ResultSet, SerializedResult};

/// Result of the query command execution
#[derive(Debug, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
    /// Rows past the limit were dropped
    pub truncated: bool,
    /// Rows in delimited form, for table output
    #[serde(skip)]
    pub serialized: SerializedResult,
}

impl QueryResult {
    pub fn from_result_set(result: ResultSet, row_bytes: usize) -> Self {
        let serialized = serialize_result(&result, row_bytes);
        let columns = result.columns().to_vec();
        let truncated = result.is_truncated();
        let rows = result
            .into_rows()
            .into_iter()
            .map(|row| row.values().to_vec())
            .collect();

        QueryResult {
            columns,
            rows,
            truncated,
            serialized,
        }
    }
}

impl Execute for QueryCmd {
    type Output = QueryResult;

    fn execute(self, session: &Session<'_>) -> Result<Self::Output, Box<dyn Error>> {
        let limits = session.client.limits();
        let max_rows = self.limit.map_or(limits.max_rows, |l| l as usize);

        let mut result = session.client.query_limited(
            session.kind,
            session.handle,
            &self.sql,
            &self.params,
            max_rows,
        )?;
        if self.strict {
            result = result.into_complete()?;
        }

        Ok(QueryResult::from_result_set(result, limits.row_bytes))
    }
}

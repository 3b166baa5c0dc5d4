//! SQLite adapter over `rusqlite`.

use std::path::Path;

use rusqlite::params_from_iter;
use rusqlite::types::ValueRef;

use super::backend::{check_param_count, LastError};
use super::cursor::{collect_rows, Cursor};
use super::{Adapter, BackendKind, DbError, NativeError, ResultSet};

/// An open SQLite database.
pub struct SqliteConnection {
    inner: rusqlite::Connection,
    last_error: LastError,
}

impl SqliteConnection {
    /// Open or create the database file at `path`. `:memory:` opens a private
    /// in-memory database.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let inner = rusqlite::Connection::open(path).map_err(|e| DbError::OpenFailed {
            kind: BackendKind::Sqlite,
            target: path.display().to_string(),
            source: native_error(&e),
        })?;
        Ok(Self {
            inner,
            last_error: LastError::default(),
        })
    }

    pub fn close(self) -> Result<(), NativeError> {
        self.inner.close().map_err(|(_, e)| native_error(&e))
    }
}

impl Adapter for SqliteConnection {
    /// The count is `sqlite3_changes`: rows touched by the most recent
    /// INSERT, UPDATE or DELETE on the connection.
    fn exec(&mut self, sql: &str) -> Result<u64, DbError> {
        let result = self
            .inner
            .execute_batch(sql)
            .map(|()| self.inner.changes())
            .map_err(batch_failed);
        self.last_error.track(result)
    }

    fn exec_with_params(&mut self, sql: &str, params: &[String]) -> Result<u64, DbError> {
        let result = execute_statement(&self.inner, sql, params);
        self.last_error.track(result)
    }

    fn query(&mut self, sql: &str, params: &[String], max_rows: usize) -> Result<ResultSet, DbError> {
        let result = query_statement(&self.inner, sql, params, max_rows);
        self.last_error.track(result)
    }

    fn last_error(&self) -> &str {
        self.last_error.as_str()
    }
}

fn execute_statement(conn: &rusqlite::Connection, sql: &str, params: &[String]) -> Result<u64, DbError> {
    let mut stmt = conn.prepare(sql).map_err(prepare_failed)?;
    check_param_count(stmt.parameter_count(), params.len())?;
    let changed = stmt
        .execute(params_from_iter(params.iter()))
        .map_err(execution_failed)?;
    Ok(changed as u64)
}

fn query_statement(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &[String],
    max_rows: usize,
) -> Result<ResultSet, DbError> {
    let mut stmt = conn.prepare(sql).map_err(prepare_failed)?;
    check_param_count(stmt.parameter_count(), params.len())?;

    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();
    let rows = stmt
        .query(params_from_iter(params.iter()))
        .map_err(execution_failed)?;

    let mut cursor = SqliteCursor { rows, width };
    collect_rows(columns, &mut cursor, max_rows)
}

struct SqliteCursor<'stmt> {
    rows: rusqlite::Rows<'stmt>,
    width: usize,
}

impl Cursor for SqliteCursor<'_> {
    fn next_row(&mut self) -> Result<Option<Vec<Option<String>>>, DbError> {
        let Some(row) = self.rows.next().map_err(execution_failed)? else {
            return Ok(None);
        };
        let values = (0..self.width)
            .map(|i| row.get_ref(i).map(value_text).map_err(execution_failed))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(values))
    }
}

fn value_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

fn native_error(e: &rusqlite::Error) -> NativeError {
    match e {
        rusqlite::Error::SqliteFailure(err, message) => NativeError::new(
            Some(err.extended_code.to_string()),
            message.clone().unwrap_or_else(|| err.to_string()),
        ),
        rusqlite::Error::SqlInputError { error, msg, .. } => {
            NativeError::new(Some(error.extended_code.to_string()), msg.clone())
        }
        other => NativeError::message(other.to_string()),
    }
}

fn prepare_failed(e: rusqlite::Error) -> DbError {
    DbError::PrepareFailed(native_error(&e))
}

fn execution_failed(e: rusqlite::Error) -> DbError {
    DbError::ExecutionFailed(native_error(&e))
}

/// `execute_batch` prepares and steps each statement in turn; an error that
/// points into the SQL text came from compiling it.
fn batch_failed(e: rusqlite::Error) -> DbError {
    match e {
        rusqlite::Error::SqlInputError { .. } => prepare_failed(e),
        _ => execution_failed(e),
    }
}

//! PostgreSQL adapter over the synchronous `postgres` client.
//!
//! Parameterized statements and queries go through the extended protocol:
//! parameters are sent in text format and the server parses them against the
//! placeholder types it inferred. Results come back in binary and are
//! rendered to text by [`conversion::PgText`]. Plain `exec` uses the simple
//! query protocol so it can run several statements.

mod conversion;

use postgres::fallible_iterator::FallibleIterator;
use postgres::{Client, NoTls, RowIter, SimpleQueryMessage, Statement};

use conversion::{native_error, PgText, TextParam};

use super::backend::{check_param_count, LastError, ServerOptions};
use super::cursor::{collect_rows, Cursor};
use super::{Adapter, BackendKind, DbError, NativeError, ResultSet};

/// An open PostgreSQL connection.
pub struct PostgresConnection {
    inner: Client,
    last_error: LastError,
}

impl PostgresConnection {
    /// Connect without TLS.
    ///
    /// # Errors
    /// Returns `OpenFailed` if the server is unreachable or rejects the
    /// credentials.
    pub fn open(server: &ServerOptions) -> Result<Self, DbError> {
        let mut config = postgres::Config::new();
        config
            .host(&server.host)
            .port(server.port)
            .user(&server.user)
            .dbname(&server.database);
        if !server.password.is_empty() {
            config.password(&server.password);
        }

        let inner = config.connect(NoTls).map_err(|e| DbError::OpenFailed {
            kind: BackendKind::Postgres,
            target: server.target(),
            source: native_error(&e),
        })?;
        Ok(Self {
            inner,
            last_error: LastError::default(),
        })
    }

    pub fn close(self) -> Result<(), NativeError> {
        self.inner.close().map_err(|e| native_error(&e))
    }

    fn prepare(&mut self, sql: &str, params: &[String]) -> Result<Statement, DbError> {
        let stmt = self.inner.prepare(sql).map_err(prepare_failed)?;
        check_param_count(stmt.params().len(), params.len())?;
        Ok(stmt)
    }

    fn execute_statement(&mut self, sql: &str, params: &[String]) -> Result<u64, DbError> {
        let stmt = self.prepare(sql, params)?;
        let text: Vec<TextParam<'_>> = params.iter().map(|p| TextParam(p)).collect();
        let refs: Vec<&(dyn postgres::types::ToSql + Sync)> = text
            .iter()
            .map(|p| p as &(dyn postgres::types::ToSql + Sync))
            .collect();
        self.inner.execute(&stmt, &refs).map_err(execution_failed)
    }

    /// Run a script, returning the row count of its last statement.
    fn execute_script(&mut self, sql: &str) -> Result<u64, DbError> {
        let messages = self.inner.simple_query(sql).map_err(script_failed)?;
        let changed = messages
            .iter()
            .filter_map(|m| match m {
                SimpleQueryMessage::CommandComplete(rows) => Some(*rows),
                _ => None,
            })
            .last()
            .unwrap_or(0);
        Ok(changed)
    }

    fn query_statement(&mut self, sql: &str, params: &[String], max_rows: usize) -> Result<ResultSet, DbError> {
        let stmt = self.prepare(sql, params)?;
        let columns: Vec<String> = stmt.columns().iter().map(|c| c.name().to_string()).collect();
        let rows = self
            .inner
            .query_raw(&stmt, params.iter().map(|p| TextParam(p)))
            .map_err(execution_failed)?;

        let mut cursor = PostgresCursor {
            width: columns.len(),
            rows,
        };
        collect_rows(columns, &mut cursor, max_rows)
    }
}

impl Adapter for PostgresConnection {
    fn exec(&mut self, sql: &str) -> Result<u64, DbError> {
        let result = self.execute_script(sql);
        self.last_error.track(result)
    }

    fn exec_with_params(&mut self, sql: &str, params: &[String]) -> Result<u64, DbError> {
        let result = self.execute_statement(sql, params);
        self.last_error.track(result)
    }

    fn query(&mut self, sql: &str, params: &[String], max_rows: usize) -> Result<ResultSet, DbError> {
        let result = self.query_statement(sql, params, max_rows);
        self.last_error.track(result)
    }

    fn last_error(&self) -> &str {
        self.last_error.as_str()
    }
}

struct PostgresCursor<'a> {
    rows: RowIter<'a>,
    width: usize,
}

impl Cursor for PostgresCursor<'_> {
    fn next_row(&mut self) -> Result<Option<Vec<Option<String>>>, DbError> {
        let Some(row) = self.rows.next().map_err(execution_failed)? else {
            return Ok(None);
        };
        let values = (0..self.width)
            .map(|i| {
                row.try_get::<_, Option<PgText>>(i)
                    .map(|v| v.map(|t| t.0))
                    .map_err(execution_failed)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(values))
    }
}

fn prepare_failed(e: postgres::Error) -> DbError {
    DbError::PrepareFailed(native_error(&e))
}

fn execution_failed(e: postgres::Error) -> DbError {
    DbError::ExecutionFailed(native_error(&e))
}

/// The simple protocol parses and runs in one round trip. SQLSTATE class 42
/// (syntax error or access rule violation) is raised while compiling.
fn script_failed(e: postgres::Error) -> DbError {
    if is_compile_error(&e) {
        prepare_failed(e)
    } else {
        execution_failed(e)
    }
}

fn is_compile_error(e: &postgres::Error) -> bool {
    e.code().is_some_and(|state| state.code().starts_with("42"))
}

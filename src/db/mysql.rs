//! MySQL adapter over the synchronous `mysql` client.
//!
//! Parameterized statements and every query go through the binary protocol:
//! the statement is prepared, its placeholder count checked, executed, and
//! closed on the server whatever the outcome. The statement cache is disabled
//! so nothing prepared outlives the call that prepared it. Plain `exec` uses
//! the text protocol so it can run several statements.

use mysql::prelude::{Protocol, Queryable};
use mysql::{Conn, OptsBuilder, QueryResult, Statement, Value};
use tracing::debug;

use super::backend::{check_param_count, LastError, ServerOptions};
use super::cursor::{collect_rows, Cursor};
use super::{Adapter, BackendKind, DbError, NativeError, ResultSet};

/// An open MySQL connection.
pub struct MySqlConnection {
    inner: Conn,
    last_error: LastError,
}

impl MySqlConnection {
    pub fn open(server: &ServerOptions) -> Result<Self, DbError> {
        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(server.host.clone()))
            .tcp_port(server.port)
            .user(Some(server.user.clone()))
            .pass(Some(server.password.clone()))
            .db_name(Some(server.database.clone()))
            .stmt_cache_size(0);

        let inner = Conn::new(opts).map_err(|e| DbError::OpenFailed {
            kind: BackendKind::MySql,
            target: server.target(),
            source: native_error(&e),
        })?;
        Ok(Self {
            inner,
            last_error: LastError::default(),
        })
    }

    /// The client sends `COM_QUIT` when the connection is dropped and
    /// reports no error for it.
    pub fn close(self) -> Result<(), NativeError> {
        drop(self.inner);
        Ok(())
    }
}

impl Adapter for MySqlConnection {
    fn exec(&mut self, sql: &str) -> Result<u64, DbError> {
        let result = match self.inner.query_drop(sql) {
            Ok(()) => Ok(self.inner.affected_rows()),
            Err(e) => Err(batch_failed(e)),
        };
        self.last_error.track(result)
    }

    fn exec_with_params(&mut self, sql: &str, params: &[String]) -> Result<u64, DbError> {
        let result = with_statement(&mut self.inner, sql, params, |conn, stmt| {
            conn.exec_drop(stmt, bind(params)).map_err(execution_failed)?;
            Ok(conn.affected_rows())
        });
        self.last_error.track(result)
    }

    fn query(&mut self, sql: &str, params: &[String], max_rows: usize) -> Result<ResultSet, DbError> {
        let result = with_statement(&mut self.inner, sql, params, |conn, stmt| {
            let rows = conn.exec_iter(stmt, bind(params)).map_err(execution_failed)?;
            collect(rows, max_rows)
        });
        self.last_error.track(result)
    }

    fn last_error(&self) -> &str {
        self.last_error.as_str()
    }
}

/// Prepare `sql`, run `f` with it and close the statement on every path.
fn with_statement<T>(
    conn: &mut Conn,
    sql: &str,
    params: &[String],
    f: impl FnOnce(&mut Conn, &Statement) -> Result<T, DbError>,
) -> Result<T, DbError> {
    let stmt = conn.prep(sql).map_err(prepare_failed)?;
    let result = check_param_count(usize::from(stmt.num_params()), params.len())
        .and_then(|()| f(conn, &stmt));
    if let Err(e) = conn.close(stmt) {
        debug!(error = %e, "failed to close prepared statement");
    }
    result
}

fn bind(params: &[String]) -> mysql::Params {
    if params.is_empty() {
        mysql::Params::Empty
    } else {
        mysql::Params::Positional(
            params
                .iter()
                .map(|p| Value::Bytes(p.as_bytes().to_vec()))
                .collect(),
        )
    }
}

fn collect<P: Protocol>(rows: QueryResult<'_, '_, '_, P>, max_rows: usize) -> Result<ResultSet, DbError> {
    let columns: Vec<String> = rows
        .columns()
        .as_ref()
        .iter()
        .map(|c| c.name_str().into_owned())
        .collect();
    let mut cursor = MySqlCursor {
        width: columns.len(),
        rows,
    };
    collect_rows(columns, &mut cursor, max_rows)
}

struct MySqlCursor<'c, 't, 'tc, P: Protocol> {
    rows: QueryResult<'c, 't, 'tc, P>,
    width: usize,
}

impl<P: Protocol> Cursor for MySqlCursor<'_, '_, '_, P> {
    fn next_row(&mut self) -> Result<Option<Vec<Option<String>>>, DbError> {
        match self.rows.next() {
            None => Ok(None),
            Some(Err(e)) => Err(execution_failed(e)),
            Some(Ok(row)) => Ok(Some(
                (0..self.width)
                    .map(|i| row.as_ref(i).and_then(value_text))
                    .collect(),
            )),
        }
    }
}

/// Render a MySQL value as text. Dates with a zero time part print as
/// `YYYY-MM-DD`.
fn value_text(value: &Value) -> Option<String> {
    let text = match *value {
        Value::NULL => return None,
        Value::Bytes(ref bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Double(d) => d.to_string(),
        Value::Date(year, month, day, 0, 0, 0, 0) => {
            format!("{:04}-{:02}-{:02}", year, month, day)
        }
        Value::Date(year, month, day, hour, minute, second, micros) => {
            let mut text = format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            );
            if micros > 0 {
                text.push_str(&format!(".{:06}", micros));
            }
            text
        }
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if negative { "-" } else { "" };
            let hours = days * 24 + u32::from(hours);
            let mut text = format!("{}{:02}:{:02}:{:02}", sign, hours, minutes, seconds);
            if micros > 0 {
                text.push_str(&format!(".{:06}", micros));
            }
            text
        }
    };
    Some(text)
}

fn native_error(e: &mysql::Error) -> NativeError {
    match e {
        mysql::Error::MySqlError(server) => {
            NativeError::new(Some(server.code.to_string()), server.message.clone())
        }
        other => NativeError::message(other.to_string()),
    }
}

fn prepare_failed(e: mysql::Error) -> DbError {
    DbError::PrepareFailed(native_error(&e))
}

fn execution_failed(e: mysql::Error) -> DbError {
    DbError::ExecutionFailed(native_error(&e))
}

/// Server errors raised while parsing or resolving names on the text
/// protocol: syntax (1064), unknown table (1146), unknown column (1054),
/// unknown function (1305).
const COMPILE_ERRORS: [u16; 4] = [1064, 1146, 1054, 1305];

fn batch_failed(e: mysql::Error) -> DbError {
    let compile = matches!(&e, mysql::Error::MySqlError(server) if COMPILE_ERRORS.contains(&server.code));
    if compile {
        prepare_failed(e)
    } else {
        execution_failed(e)
    }
}

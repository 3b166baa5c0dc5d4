//! The client surface for hosts that speak 16-bit code-unit text.
//!
//! Every text argument is encoded into a call-local buffer of
//! `Limits::text_bytes` bytes before it reaches a backend. Text that does not
//! fit is rejected with `EncodingOverflow` rather than sent shortened.

use crate::db::{BackendKind, Client, DbError, Handle, Limits, OpenOptions, ServerOptions};
use crate::encoding::{decode_from_native, encode_to_native, to_host};

/// One serialized row as host text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRow {
    /// `name=value` pairs joined by tabs, ending in a newline.
    pub text: Vec<u16>,
    /// True when trailing columns did not fit the row budget.
    pub truncated: bool,
}

/// Query output as host text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRows {
    pub rows: Vec<HostRow>,
    /// True when rows past the row ceiling were dropped.
    pub truncated: bool,
}

/// Arguments of [`HostBridge::open`]. Server fields are ignored for SQLite.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostOpen<'a> {
    pub host: &'a [u16],
    pub port: u16,
    pub user: &'a [u16],
    pub password: &'a [u16],
    /// Database name, or the file path for SQLite.
    pub database: &'a [u16],
}

/// A [`Client`] addressed with host handles and host text.
pub struct HostBridge {
    client: Client,
}

impl Default for HostBridge {
    fn default() -> Self {
        Self::new(Limits::default())
    }
}

impl HostBridge {
    pub fn new(limits: Limits) -> Self {
        Self {
            client: Client::new(limits),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Open a connection, returning its non-negative handle.
    pub fn open(&self, kind: BackendKind, args: HostOpen<'_>) -> Result<i64, DbError> {
        let database = self.native_text(args.database)?;
        let options = match kind {
            BackendKind::Sqlite => OpenOptions::sqlite(database),
            BackendKind::MySql | BackendKind::Postgres => {
                let server = ServerOptions {
                    host: self.native_text(args.host)?,
                    port: args.port,
                    user: self.native_text(args.user)?,
                    password: self.native_text(args.password)?,
                    database,
                };
                if kind == BackendKind::MySql {
                    OpenOptions::MySql(server)
                } else {
                    OpenOptions::Postgres(server)
                }
            }
        };
        self.client.open(&options).map(Handle::raw)
    }

    /// Run SQL without parameters, returning the rows it changed.
    pub fn exec(&self, kind: BackendKind, handle: i64, sql: &[u16]) -> Result<u64, DbError> {
        let sql = self.native_text(sql)?;
        self.client.exec(kind, Handle::from_raw(handle), &sql)
    }

    /// Run one statement with host text parameters, returning the rows it
    /// changed.
    pub fn exec_with_params(
        &self,
        kind: BackendKind,
        handle: i64,
        sql: &[u16],
        params: &[&[u16]],
    ) -> Result<u64, DbError> {
        let sql = self.native_text(sql)?;
        let params = self.native_params(params)?;
        self.client
            .exec_with_params(kind, Handle::from_raw(handle), &sql, &params)
    }

    /// Run a query and return its rows serialized as host text.
    pub fn query(
        &self,
        kind: BackendKind,
        handle: i64,
        sql: &[u16],
        params: &[&[u16]],
    ) -> Result<HostRows, DbError> {
        let sql = self.native_text(sql)?;
        let params = self.native_params(params)?;
        let serialized = self
            .client
            .query_serialized(kind, Handle::from_raw(handle), &sql, &params)?;

        Ok(HostRows {
            rows: serialized
                .rows
                .iter()
                .map(|row| HostRow {
                    text: to_host(&row.text),
                    truncated: row.truncated,
                })
                .collect(),
            truncated: serialized.truncated,
        })
    }

    /// Release a handle. An already closed handle is not an error.
    pub fn close(&self, kind: BackendKind, handle: i64) -> Result<(), DbError> {
        self.client.close(kind, Handle::from_raw(handle))
    }

    /// The last native error message, widened byte by byte.
    pub fn last_error(&self, kind: BackendKind, handle: i64) -> Result<Vec<u16>, DbError> {
        let message = self.client.last_error(kind, Handle::from_raw(handle))?;
        Ok(decode_from_native(message.as_bytes()))
    }

    fn native_text(&self, units: &[u16]) -> Result<String, DbError> {
        let budget = self.client.limits().text_bytes;
        let encoded = encode_to_native(units, budget);
        if encoded.is_truncated() {
            return Err(DbError::EncodingOverflow {
                consumed: encoded.consumed,
                total: encoded.total,
                budget,
            });
        }
        Ok(encoded.into_string())
    }

    fn native_params(&self, params: &[&[u16]]) -> Result<Vec<String>, DbError> {
        params.iter().map(|p| self.native_text(p)).collect()
    }
}

//! The handle-based client facade.

use tracing::{debug, warn};

use super::registry::RegistryFull;
use super::serializer::{serialize_result, SerializedResult};
use super::{Adapter, BackendKind, Connection, DbError, Handle, HandleRegistry, Limits, OpenOptions, ResultSet};

/// Opens connections of every backend kind and routes calls to them by handle.
///
/// Each kind has its own handle table, so a SQLite handle and a MySQL handle
/// may share the same integer. `Client` is `Sync`; calls on different handles
/// proceed in parallel.
pub struct Client {
    sqlite: HandleRegistry<Connection>,
    mysql: HandleRegistry<Connection>,
    postgres: HandleRegistry<Connection>,
    limits: Limits,
}

impl Default for Client {
    fn default() -> Self {
        Self::new(Limits::default())
    }
}

impl Client {
    pub fn new(limits: Limits) -> Self {
        Self {
            sqlite: HandleRegistry::new(BackendKind::Sqlite, limits.registry_capacity),
            mysql: HandleRegistry::new(BackendKind::MySql, limits.registry_capacity),
            postgres: HandleRegistry::new(BackendKind::Postgres, limits.registry_capacity),
            limits,
        }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn registry(&self, kind: BackendKind) -> &HandleRegistry<Connection> {
        match kind {
            BackendKind::Sqlite => &self.sqlite,
            BackendKind::MySql => &self.mysql,
            BackendKind::Postgres => &self.postgres,
        }
    }

    /// Open a connection and register it.
    ///
    /// # Errors
    /// `InvalidOptions` or `OpenFailed` when the connection cannot be made;
    /// `RegistryFull` when every slot of the kind is taken, in which case the
    /// new connection is closed again before returning.
    pub fn open(&self, options: &OpenOptions) -> Result<Handle, DbError> {
        let kind = options.kind();
        let connection = Connection::open(options)?;
        debug!(%kind, target = %options.target(), "opened connection");

        self.registry(kind).store(connection).map_err(
            |RegistryFull { capacity, connection }| {
                close_connection(kind, connection);
                DbError::RegistryFull { kind, capacity }
            },
        )
    }

    /// Release `handle` and disconnect.
    ///
    /// Closing a handle that is already closed succeeds. Errors raised by the
    /// native library while disconnecting are logged, and the slot is freed
    /// regardless.
    pub fn close(&self, kind: BackendKind, handle: Handle) -> Result<(), DbError> {
        if let Some(connection) = self.registry(kind).remove(handle)? {
            close_connection(kind, connection);
        }
        Ok(())
    }

    /// Run SQL that takes no parameters, returning the rows it changed.
    pub fn exec(&self, kind: BackendKind, handle: Handle, sql: &str) -> Result<u64, DbError> {
        self.registry(kind).with_connection(handle, |c| c.exec(sql))
    }

    /// Run one statement with positional text parameters, returning the rows
    /// it changed.
    pub fn exec_with_params(
        &self,
        kind: BackendKind,
        handle: Handle,
        sql: &str,
        params: &[String],
    ) -> Result<u64, DbError> {
        self.registry(kind)
            .with_connection(handle, |c| c.exec_with_params(sql, params))
    }

    /// Run a query, keeping at most `limits().max_rows` rows.
    pub fn query(
        &self,
        kind: BackendKind,
        handle: Handle,
        sql: &str,
        params: &[String],
    ) -> Result<ResultSet, DbError> {
        self.query_limited(kind, handle, sql, params, self.limits.max_rows)
    }

    /// Run a query with an explicit row ceiling.
    pub fn query_limited(
        &self,
        kind: BackendKind,
        handle: Handle,
        sql: &str,
        params: &[String],
        max_rows: usize,
    ) -> Result<ResultSet, DbError> {
        self.registry(kind)
            .with_connection(handle, |c| c.query(sql, params, max_rows))
    }

    /// Run a query and serialize its rows with the configured row budget.
    pub fn query_serialized(
        &self,
        kind: BackendKind,
        handle: Handle,
        sql: &str,
        params: &[String],
    ) -> Result<SerializedResult, DbError> {
        let result = self.query(kind, handle, sql, params)?;
        Ok(serialize_result(&result, self.limits.row_bytes))
    }

    /// Message of the last failed operation on `handle`, empty if none.
    pub fn last_error(&self, kind: BackendKind, handle: Handle) -> Result<String, DbError> {
        self.registry(kind)
            .with_connection(handle, |c| Ok(c.last_error().to_string()))
    }
}

fn close_connection(kind: BackendKind, connection: Connection) {
    match connection.close() {
        Ok(()) => debug!(%kind, "closed connection"),
        Err(e) => warn!(%kind, error = %e, "error while closing connection"),
    }
}

//! Backend kinds, connection options and the adapter interface.
//!
//! Every backend implements [`Adapter`]. The [`Connection`] enum carries one
//! live native connection of any kind and dispatches adapter calls to it, so
//! a single build serves all three backends side by side.

use std::fmt;
use std::path::PathBuf;

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

use super::{DbError, MySqlConnection, NativeError, PostgresConnection, ResultSet, SqliteConnection};

/// The database systems a [`Client`](super::Client) can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Embedded engine, opened from a file path.
    Sqlite,
    /// Networked server.
    #[serde(rename = "mysql")]
    MySql,
    /// Networked server.
    Postgres,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [Self::Sqlite, Self::MySql, Self::Postgres];

    pub fn name(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::MySql => "mysql",
            Self::Postgres => "postgres",
        }
    }

    /// Port used when a connection URL leaves it out.
    pub fn default_port(self) -> Option<u16> {
        match self {
            Self::Sqlite => None,
            Self::MySql => Some(3306),
            Self::Postgres => Some(5432),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Connection settings for a networked backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerOptions {
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub database: String,
}

impl ServerOptions {
    /// `user@host:port/database`, safe to log.
    pub fn target(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }

    fn validate(&self) -> Result<(), DbError> {
        let missing = [
            ("host", self.host.is_empty()),
            ("user", self.user.is_empty()),
            ("database", self.database.is_empty()),
            ("port", self.port == 0),
        ];
        match missing.iter().find(|(_, is_missing)| *is_missing) {
            Some((field, _)) => Err(DbError::InvalidOptions {
                message: format!("missing {}", field),
            }),
            None => Ok(()),
        }
    }
}

/// Everything needed to open one native connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOptions {
    Sqlite { path: PathBuf },
    MySql(ServerOptions),
    Postgres(ServerOptions),
}

impl OpenOptions {
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self::Sqlite { path: path.into() }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Sqlite { .. } => BackendKind::Sqlite,
            Self::MySql(_) => BackendKind::MySql,
            Self::Postgres(_) => BackendKind::Postgres,
        }
    }

    /// Description of what is being opened, without the password.
    pub fn target(&self) -> String {
        match self {
            Self::Sqlite { path } => path.display().to_string(),
            Self::MySql(server) | Self::Postgres(server) => server.target(),
        }
    }

    /// Reject incomplete options before any native call.
    pub fn validate(&self) -> Result<(), DbError> {
        match self {
            Self::Sqlite { path } if path.as_os_str().is_empty() => Err(DbError::InvalidOptions {
                message: "missing path".to_string(),
            }),
            Self::Sqlite { .. } => Ok(()),
            Self::MySql(server) | Self::Postgres(server) => server.validate(),
        }
    }
}

/// Operations every backend connection supports.
///
/// Parameters are bound positionally as text. Implementations record the
/// message of their most recent failure for [`Adapter::last_error`] and clear
/// it when an operation succeeds.
///
/// SQL the backend cannot compile fails with `PrepareFailed` from every
/// entry point; errors raised while running compiled SQL are
/// `ExecutionFailed`.
#[enum_dispatch]
pub trait Adapter {
    /// Run SQL that takes no parameters and returns no rows.
    ///
    /// Returns the number of rows changed by the last statement that changed
    /// any, as the backend reports it.
    fn exec(&mut self, sql: &str) -> Result<u64, DbError>;

    /// Run one statement with positional text parameters, returning the
    /// number of rows it changed.
    fn exec_with_params(&mut self, sql: &str, params: &[String]) -> Result<u64, DbError>;

    /// Run a statement and collect at most `max_rows` rows.
    fn query(&mut self, sql: &str, params: &[String], max_rows: usize) -> Result<ResultSet, DbError>;

    /// Message of the most recent failed operation, empty if it succeeded.
    fn last_error(&self) -> &str;
}

/// A live native connection of one of the supported kinds.
#[enum_dispatch(Adapter)]
pub enum Connection {
    Sqlite(SqliteConnection),
    MySql(MySqlConnection),
    Postgres(PostgresConnection),
}

impl Connection {
    /// Open a native connection. Nothing is left allocated on failure.
    pub fn open(options: &OpenOptions) -> Result<Self, DbError> {
        options.validate()?;
        let connection = match options {
            OpenOptions::Sqlite { path } => SqliteConnection::open(path)?.into(),
            OpenOptions::MySql(server) => MySqlConnection::open(server)?.into(),
            OpenOptions::Postgres(server) => PostgresConnection::open(server)?.into(),
        };
        Ok(connection)
    }

    /// Disconnect, reporting any error the native library raised while closing.
    pub fn close(self) -> Result<(), NativeError> {
        match self {
            Self::Sqlite(c) => c.close(),
            Self::MySql(c) => c.close(),
            Self::Postgres(c) => c.close(),
        }
    }
}

/// The message of the last failed operation on a connection.
#[derive(Debug, Default)]
pub(crate) struct LastError(String);

impl LastError {
    /// Remember the outcome of an operation and pass it through.
    pub(crate) fn track<T>(&mut self, result: Result<T, DbError>) -> Result<T, DbError> {
        match &result {
            Ok(_) => self.0.clear(),
            Err(e) => {
                self.0 = match e.native() {
                    Some(native) => native.message.clone(),
                    None => e.to_string(),
                }
            }
        }
        result
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

/// Fail with `ParamMismatch` unless the counts agree.
pub(crate) fn check_param_count(expected: usize, actual: usize) -> Result<(), DbError> {
    if expected == actual {
        Ok(())
    } else {
        Err(DbError::ParamMismatch { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn server() -> ServerOptions {
        ServerOptions {
            host: "localhost".into(),
            port: 3306,
            user: "app".into(),
            password: "secret".into(),
            database: "shop".into(),
        }
    }

    #[rstest]
    fn test_kind_names() {
        let names: Vec<_> = BackendKind::ALL.iter().map(|k| k.to_string()).collect();
        assert_eq!(names, ["sqlite", "mysql", "postgres"]);
    }

    #[rstest]
    fn test_target_hides_password() {
        let options = OpenOptions::MySql(server());
        assert_eq!(options.target(), "app@localhost:3306/shop");
        assert!(!options.target().contains("secret"));
    }

    #[rstest]
    fn test_validate_accepts_complete_options() {
        assert!(OpenOptions::MySql(server()).validate().is_ok());
        assert!(OpenOptions::sqlite(":memory:").validate().is_ok());
    }

    #[rstest]
    #[case::host(ServerOptions { host: String::new(), ..server() }, "missing host")]
    #[case::user(ServerOptions { user: String::new(), ..server() }, "missing user")]
    #[case::database(ServerOptions { database: String::new(), ..server() }, "missing database")]
    #[case::port(ServerOptions { port: 0, ..server() }, "missing port")]
    fn test_validate_rejects_missing_fields(#[case] options: ServerOptions, #[case] expected: &str) {
        let err = OpenOptions::Postgres(options).validate().unwrap_err();
        assert!(err.to_string().contains(expected), "{}", err);
    }

    #[rstest]
    fn test_validate_rejects_empty_path() {
        assert!(OpenOptions::sqlite("").validate().is_err());
    }

    #[rstest]
    fn test_last_error_tracks_outcome() {
        let mut last = LastError::default();
        let _ = last.track::<()>(Err(DbError::ExecutionFailed(NativeError::message("no such table: t"))));
        assert_eq!(last.as_str(), "no such table: t");
        let _ = last.track(Ok(()));
        assert_eq!(last.as_str(), "");
    }

    #[rstest]
    fn test_param_count_check() {
        assert!(check_param_count(2, 2).is_ok());
        assert!(matches!(
            check_param_count(1, 0),
            Err(DbError::ParamMismatch { expected: 1, actual: 0 })
        ));
    }
}

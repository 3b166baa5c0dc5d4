//! Uniform access to SQLite, MySQL and PostgreSQL connections.
//!
//! This module provides the database abstraction layer:
//! - Handle registries mapping small integers to live native connections
//! - One adapter per backend kind, dispatched through the `Connection` enum
//! - Result collection with a row ceiling and explicit truncation flag
//! - Serialization of result rows into bounded, delimited text
//!
//! # Architecture
//!
//! A [`Client`] owns one [`HandleRegistry`] per [`BackendKind`]. Opening a
//! connection stores the native object in the first free slot and hands out
//! its index. Every later call names the kind and the handle; the registry
//! validates both before any native call is made. Each slot holds its
//! connection behind its own lock, so calls on different handles run in
//! parallel while the registry table itself is only locked for lookups.
//!
//! # Type Decisions
//!
//! **Why text for every value?**
//! Callers bind parameters as text and read values as text. Each adapter
//! renders native values into strings at the cursor, so the collector and
//! serializer never see backend types.
//!
//! **Why keep the last error on the connection?**
//! The MySQL and PostgreSQL clients return errors by value and have no
//! "last error" call. Adapters record the most recent failure message on the
//! connection object so `last_error` behaves the same for all three kinds.

mod backend;
mod client;
mod config;
mod cursor;
mod escape;
mod mysql;
mod postgres;
mod registry;
mod serializer;
mod sqlite;

pub use backend::{Adapter, BackendKind, Connection, OpenOptions, ServerOptions};
pub use client::Client;
pub use config::{DatabaseConfig, Limits, DEFAULT_DATABASE};
pub use cursor::{ResultSet, Row};
pub use escape::{escape_name, escape_value};
pub use registry::{Handle, HandleRegistry, RegistryFull};
pub use self::mysql::MySqlConnection;
pub use self::postgres::PostgresConnection;
pub use serializer::{
    serialize_result, serialize_row, SerializedResult, SerializedRow, COLUMN_DELIMITER, ROW_DELIMITER,
};
pub use sqlite::SqliteConnection;

use std::fmt;

use thiserror::Error;

/// Error code and message reported by a native client library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeError {
    /// SQLite extended result code, MySQL error number or PostgreSQL SQLSTATE.
    pub code: Option<String>,
    pub message: String,
}

impl NativeError {
    pub fn new(code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// An error raised without a native code (connection lost, decode failure).
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Database error types
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid {kind} handle {handle}")]
    InvalidHandle { kind: BackendKind, handle: i64 },

    #[error("{kind} handle table is full ({capacity} connections open)")]
    RegistryFull { kind: BackendKind, capacity: usize },

    #[error("Invalid connection options: {message}")]
    InvalidOptions { message: String },

    #[error("Failed to open {kind} connection to '{target}': {source}")]
    OpenFailed {
        kind: BackendKind,
        target: String,
        source: NativeError,
    },

    #[error("Failed to prepare statement: {0}")]
    PrepareFailed(NativeError),

    #[error("Statement expects {expected} parameters, got {actual}")]
    ParamMismatch { expected: usize, actual: usize },

    #[error("Execution failed: {0}")]
    ExecutionFailed(NativeError),

    #[error("Text does not fit the {budget}-byte conversion buffer ({consumed} of {total} code units encoded)")]
    EncodingOverflow {
        consumed: usize,
        total: usize,
        budget: usize,
    },

    #[error("Result truncated at {max_rows} rows")]
    ResultTruncated { max_rows: usize },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl std::error::Error for NativeError {}

impl DbError {
    /// The native error carried by this failure, if any.
    pub fn native(&self) -> Option<&NativeError> {
        match self {
            Self::OpenFailed { source, .. } => Some(source),
            Self::PrepareFailed(e) | Self::ExecutionFailed(e) => Some(e),
            _ => None,
        }
    }
}

//! Shared test utilities for execute and output tests.

use crate::commands::Session;
use crate::db::{BackendKind, Client, Handle, Limits, OpenOptions, ResultSet};

/// A client with one open in-memory SQLite connection.
pub struct TestDb {
    pub client: Client,
    pub handle: Handle,
}

impl TestDb {
    pub fn memory() -> Self {
        Self::with_limits(Limits::default())
    }

    pub fn with_limits(limits: Limits) -> Self {
        let client = Client::new(limits);
        let handle = client
            .open(&OpenOptions::sqlite(":memory:"))
            .expect("Failed to open in-memory database");
        Self { client, handle }
    }

    pub fn session(&self) -> Session<'_> {
        Session::new(&self.client, BackendKind::Sqlite, self.handle)
    }

    /// Run setup SQL, panicking on failure.
    pub fn exec(&self, sql: &str) {
        self.client
            .exec(BackendKind::Sqlite, self.handle, sql)
            .expect("Setup SQL should succeed");
    }

    pub fn query(&self, sql: &str) -> ResultSet {
        self.client
            .query(BackendKind::Sqlite, self.handle, sql, &[])
            .expect("Query should succeed")
    }
}

/// Owned parameter list from string literals.
pub fn params(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

use std::error::Error;

use serde::Serialize;

use super::ExecCmd;
use crate::commands::{Execute, Session};

/// Result of the exec command execution
#[derive(Debug, Serialize)]
pub struct ExecResult {
    pub backend: String,
    pub handle: i64,
    pub parameters: usize,
    /// Rows changed, as reported by the backend.
    pub changed: u64,
}

impl Execute for ExecCmd {
    type Output = ExecResult;

    fn execute(self, session: &Session<'_>) -> Result<Self::Output, Box<dyn Error>> {
        let changed = if self.params.is_empty() {
            session.client.exec(session.kind, session.handle, &self.sql)?
        } else {
            session
                .client
                .exec_with_params(session.kind, session.handle, &self.sql, &self.params)?
        };

        Ok(ExecResult {
            backend: session.kind.to_string(),
            handle: session.handle.raw(),
            parameters: self.params.len(),
            changed,
        })
    }
}

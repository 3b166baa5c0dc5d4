//! Command definitions and implementations.
//!
//! Each command is defined in its own module with:
//! - The command struct with clap attributes for CLI parsing
//! - An `execute` module running it against an open [`Session`]
//! - An `output` module implementing [`Outputable`] for its result

mod exec;
mod query;

pub use exec::{ExecCmd, ExecResult};
pub use query::{QueryCmd, QueryResult};

use clap::Subcommand;
use std::error::Error;

use crate::db::{BackendKind, Client, Handle};
use crate::output::{OutputFormat, Outputable};

/// One open connection that commands run against.
#[derive(Clone, Copy)]
pub struct Session<'a> {
    pub client: &'a Client,
    pub kind: BackendKind,
    pub handle: Handle,
}

impl<'a> Session<'a> {
    pub fn new(client: &'a Client, kind: BackendKind, handle: Handle) -> Self {
        Self { client, kind, handle }
    }
}

/// Trait for executing commands with command-specific result types.
pub trait Execute {
    type Output: Outputable;

    fn execute(self, session: &Session<'_>) -> Result<Self::Output, Box<dyn Error>>;
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a statement that returns no rows
    Exec(ExecCmd),

    /// Run a query and print its rows
    Query(QueryCmd),
}

impl Command {
    /// Execute the command and return formatted output
    pub fn run(self, session: &Session<'_>, format: OutputFormat) -> Result<String, Box<dyn Error>> {
        match self {
            Command::Exec(cmd) => {
                let result = cmd.execute(session)?;
                Ok(result.format(format))
            }
            Command::Query(cmd) => {
                let result = cmd.execute(session)?;
                Ok(result.format(format))
            }
        }
    }
}

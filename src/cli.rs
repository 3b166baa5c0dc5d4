//! CLI argument definitions.
//!
//! This module contains the top-level CLI structure and connection setup.
//! Individual command definitions are in the `commands` module.

use clap::Parser;
use std::error::Error;
use tracing::debug;

use crate::commands::{Command, Session};
use crate::config::ConfigFile;
use crate::db::{Client, DatabaseConfig, Limits};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Database URL or SQLite file path.
    /// Defaults to .sql_bridge.json, then DATABASE_URL / SQLITE_PATH, then ./bridge.sqlite
    #[arg(short, long, global = true)]
    pub db: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    /// Which database to open.
    pub fn database_config(&self) -> Result<DatabaseConfig, Box<dyn Error>> {
        let config = match &self.db {
            Some(url) => DatabaseConfig::from_url(url)?,
            None => DatabaseConfig::resolve()?,
        };
        Ok(config)
    }

    /// Open the database, run the command and close the connection again.
    pub fn run(self) -> Result<String, Box<dyn Error>> {
        let limits = match ConfigFile::load_if_present()? {
            Some(file) => file.limits,
            None => Limits::default(),
        };
        let config = self.database_config()?;
        debug!(kind = %config.kind(), "resolved database");

        let client = Client::new(limits);
        let handle = config.connect(&client)?;
        let session = Session::new(&client, config.kind(), handle);

        let output = self.command.run(&session, self.format);
        client.close(config.kind(), handle)?;
        output
    }
}

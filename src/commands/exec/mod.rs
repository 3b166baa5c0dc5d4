mod execute;
mod output;

pub use execute::ExecResult;

use clap::Args;

/// Run a statement that returns no rows
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  sql_bridge exec 'CREATE TABLE t (id INTEGER, name TEXT)'
  sql_bridge exec 'INSERT INTO t VALUES (?, ?)' -p 1 -p Ann
  sql_bridge --db postgres://app@localhost/shop exec 'DELETE FROM t WHERE id = $1' -p 1")]
pub struct ExecCmd {
    /// SQL to run. Without parameters it may hold several statements
    pub sql: String,

    /// Positional parameter bound as text, repeat once per placeholder
    #[arg(short = 'p', long = "param")]
    pub params: Vec<String>,
}

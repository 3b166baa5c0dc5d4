mod execute;
mod output;

pub use execute::QueryResult;

use clap::Args;

/// Run a query and print its rows
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  sql_bridge query 'SELECT * FROM t'
  sql_bridge query 'SELECT * FROM t WHERE id = ?' -p 1
  sql_bridge query 'SELECT * FROM big' --limit 50 --strict   # Fail instead of truncating
  sql_bridge -f json query 'SELECT name FROM t'")]
pub struct QueryCmd {
    /// SQL query to run
    pub sql: String,

    /// Positional parameter bound as text, repeat once per placeholder
    #[arg(short = 'p', long = "param")]
    pub params: Vec<String>,

    /// Maximum number of rows to keep (defaults to the configured row ceiling)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub limit: Option<u32>,

    /// Fail when the query produces more rows than the limit
    #[arg(long, default_value_t = false)]
    pub strict: bool,
}

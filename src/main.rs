use clap::Parser;
use tracing_subscriber::EnvFilter;

use sql_bridge::cli::Args;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();
    let output = args.run()?;
    println!("{}", output);
    Ok(())
}

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use tracing::{info, Level};

mod cli;
mod config;
mod core;
mod error;

use cli::Cli;
use crate::core::Engine;

fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            // Usage errors go to stdout; stderr is reserved for diagnostics
            println!("{}", err);
            std::process::exit(1);
        }
    };

    // Initialize logging on stderr so stdout stays a pure record stream
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting mcextract v{}", env!("CARGO_PKG_VERSION"));

    let engine = Engine::new(cli.config.as_deref())?;

    cli.execute(engine)
}

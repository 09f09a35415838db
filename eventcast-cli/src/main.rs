//! Binary crate for the `eventcast` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration and the interactive lookup session
//! - Human-friendly output formatting

use clap::Parser;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod cli;
mod interactive;
mod render;

fn setup_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    setup_logging(cmd.verbose);
    cmd.run().await
}

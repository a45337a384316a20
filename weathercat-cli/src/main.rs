//! Binary crate for the `weathercat` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Logging setup
//! - Interactive configuration

use clap::Parser;
use tracing_subscriber::EnvFilter;
use weathercat_core::Error;

mod cli;

const DEBUG_FILTER: &str = "info,weathercat=debug,weathercat_core=debug";

fn init_tracing(debug: bool) {
    let fallback = if debug { DEBUG_FILTER } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse_from(cli::coordinate_words(std::env::args_os()));
    init_tracing(cmd.debug);

    match cmd.run().await {
        Err(e) if matches!(e.downcast_ref::<Error>(), Some(Error::NotFound(_))) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
        result => result,
    }
}

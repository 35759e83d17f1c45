//! passgate - sign in to a pass-management backend and make authorized requests.
//!
//! A thin wrapper over `passgate-http`: the session is persisted to a file in
//! the data directory, so a login survives between invocations exactly the
//! way a browser session survives a page reload.

mod cli;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::Cli;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    let config = Config::resolve(&cli.global)?;
    commands::handle(cli.command, &config).await
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so command output on stdout stays machine-readable
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

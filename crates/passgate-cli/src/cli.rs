//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser};

use crate::commands::Command;

/// Sign in to a passgate backend and make authorized requests.
#[derive(Parser, Debug)]
#[command(name = "passgate")]
#[command(author, version = env!("PASSGATE_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Backend base URL
    #[arg(long, env = "PASSGATE_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Application profile whose session to use (admin or guard)
    #[arg(long, env = "PASSGATE_APP", global = true)]
    pub app: Option<String>,

    /// Directory holding the persisted session
    #[arg(long, env = "PASSGATE_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,
}

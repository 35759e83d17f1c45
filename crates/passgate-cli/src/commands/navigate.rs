//! Navigate command implementation.

use anyhow::{Result, bail};
use clap::Args;

use passgate_core::{NavigationOutcome, Navigator};

use crate::config::Config;
use crate::output;

#[derive(Args, Debug)]
pub struct NavigateArgs {
    /// Destination path (e.g. /passes or /result/42)
    pub path: String,
}

pub fn run(args: NavigateArgs, config: &Config) -> Result<()> {
    let session = config.session()?;
    let mut navigator = Navigator::new(config.guard(session));

    match navigator.navigate(&args.path) {
        NavigationOutcome::Entered(path) => {
            output::success(format!("Entered {path}"));
        }
        NavigationOutcome::Redirected { requested, to } => {
            output::field("Requested", &requested);
            output::field("Redirected", &to);
        }
        NavigationOutcome::Blocked { requested } => {
            bail!("Navigation to {requested} was blocked: the login route is protected");
        }
    }

    Ok(())
}

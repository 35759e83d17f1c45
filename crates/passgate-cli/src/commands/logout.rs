//! Logout command implementation.

use anyhow::Result;
use clap::Args;

use crate::config::Config;
use crate::output;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub fn run(_args: LogoutArgs, config: &Config) -> Result<()> {
    let session = config.session()?;
    let was_authenticated = session.is_authenticated();

    session.logout();

    if was_authenticated {
        output::success("Logged out");
    } else {
        output::success("No active session");
    }
    Ok(())
}

//! Whoami command implementation.

use anyhow::{Result, bail};
use clap::Args;

use crate::config::Config;
use crate::output;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Print the stored profile as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: WhoamiArgs, config: &Config) -> Result<()> {
    let session = config.session()?;

    if !session.is_authenticated() {
        bail!("No active session. Run 'passgate login' first.");
    }

    let principal = session.principal();

    if args.json {
        return output::json_pretty(&principal);
    }

    output::field("App", config.profile.name());
    output::field("API", config.api.as_str());
    match principal {
        Some(principal) => {
            if let Some(id) = principal.id() {
                output::field("ID", id);
            }
            if let Some(username) = principal.username() {
                output::field("Username", username);
            }
            if let Some(name) = principal.display_name() {
                output::field("Name", name);
            }
            if let Some(role) = principal.role() {
                output::field("Role", role);
            }
        }
        None => output::field("User", "(no profile stored)"),
    }

    Ok(())
}

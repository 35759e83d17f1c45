//! Login command implementation.

use anyhow::{Result, bail};
use clap::Args;

use passgate_core::Credentials;

use crate::config::Config;
use crate::output;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Username to authenticate with
    #[arg(long)]
    pub identifier: String,

    /// Account password
    #[arg(long)]
    pub password: String,
}

pub async fn run(args: LoginArgs, config: &Config) -> Result<()> {
    let session = config.session()?;
    let credentials = Credentials::new(&args.identifier, &args.password);

    output::progress("Logging in...");

    if !session.login_with(&credentials).await {
        let message = session.last_error().unwrap_or_default();
        output::error(&message);
        bail!("Login failed for '{}'", args.identifier);
    }

    output::success("Logged in successfully");
    println!();
    output::field("App", config.profile.name());
    if let Some(principal) = session.principal() {
        if let Some(name) = principal.display_name() {
            output::field("User", name);
        }
        if let Some(role) = principal.role() {
            output::field("Role", role);
        }
    }

    Ok(())
}

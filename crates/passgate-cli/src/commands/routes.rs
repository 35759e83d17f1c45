//! Routes command implementation.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::config::Config;
use crate::output;

#[derive(Args, Debug)]
pub struct RoutesArgs {}

pub fn run(_args: RoutesArgs, config: &Config) -> Result<()> {
    let session = config.session()?;
    let guard = config.guard(session);

    for route in guard.routes().iter() {
        let access = if route.requires_auth() {
            "protected".yellow()
        } else {
            "public".green()
        };
        println!("{:<20} {}", route.pattern(), access);
    }

    println!();
    output::field("Login", guard.login_path());
    Ok(())
}

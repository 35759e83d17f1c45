//! Subcommand implementations.

mod login;
mod logout;
mod navigate;
mod request;
mod routes;
mod whoami;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and persist the session
    Login(login::LoginArgs),

    /// End the current session
    Logout(logout::LogoutArgs),

    /// Display the signed-in user
    Whoami(whoami::WhoamiArgs),

    /// Send an authorized request to the backend
    Request(request::RequestArgs),

    /// Resolve a navigation through the route guard
    Navigate(navigate::NavigateArgs),

    /// List the application's routes
    Routes(routes::RoutesArgs),
}

pub async fn handle(cmd: Command, config: &Config) -> Result<()> {
    match cmd {
        Command::Login(args) => login::run(args, config).await,
        Command::Logout(args) => logout::run(args, config),
        Command::Whoami(args) => whoami::run(args, config),
        Command::Request(args) => request::run(args, config).await,
        Command::Navigate(args) => navigate::run(args, config),
        Command::Routes(args) => routes::run(args, config),
    }
}

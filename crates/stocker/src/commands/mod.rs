//! Command dispatch: bridges CLI args -> session calls -> output formatting.

pub mod config_cmd;
pub mod entries;
pub mod items;
pub mod session;
pub mod util;
pub mod warehouses;

use tracing::debug;

use stocker_core::Session;

use crate::cli::{Command, GlobalOpts};
use crate::config::Config;
use crate::error::CliError;

/// Dispatch a server-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    session: &Session,
    cfg: Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Command::Token = cmd {
        return session::token(session, global).await;
    }

    // Fetch a token up front; a failure here resurfaces through the
    // request's own 401 handling.
    if let Err(e) = session.api().refresher().ensure_token().await {
        debug!(error = %e, "initial token request failed");
    }

    match cmd {
        Command::Warehouses(args) => warehouses::handle(session, args, global).await,
        Command::Use(args) => warehouses::select(session, args, cfg, global).await,
        Command::Items(args) => items::handle(session, args, global).await,
        Command::Entries(args) => entries::handle(session, args, global).await,
        // Handled before a session exists
        Command::Token
        | Command::Login(_)
        | Command::Logout
        | Command::Whoami
        | Command::Config(_)
        | Command::Completions(_) => Ok(()),
    }
}

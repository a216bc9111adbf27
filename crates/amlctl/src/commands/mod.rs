//! Command dispatch: bridges CLI args -> console handles -> output formatting.

pub mod alerts;
pub mod analytics;
pub mod auth;
pub mod cases;
pub mod config_cmd;
pub mod customers;
pub mod devices;
pub mod reports;
pub mod transactions;
pub mod util;

use amlctl_core::Console;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to its handler.
pub async fn dispatch(cmd: Command, console: &Console, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => auth::login(console, args, global).await,
        Command::Logout => auth::logout(console, global).await,
        Command::Whoami => auth::whoami(console, global).await,
        Command::Register(args) => auth::register(console, args, global).await,
        Command::Customers(args) => customers::handle(console, args, global).await,
        Command::Transactions(args) => transactions::handle(console, args, global).await,
        Command::Alerts(args) => alerts::handle(console, args, global).await,
        Command::Cases(args) => cases::handle(console, args, global).await,
        Command::Reports(args) => reports::handle(console, args, global).await,
        Command::Devices(args) => devices::handle(console, args, global).await,
        Command::Analytics(args) => analytics::handle(console, args, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions run without a backend".into(),
        )),
    }
}

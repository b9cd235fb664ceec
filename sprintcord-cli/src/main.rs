//! sprintcord: mirror the active Jira sprint into Discord threads.
//!
//! # Usage
//!
//! ```text
//! sprintcord daemon start|stop|status
//! sprintcord sync [--json]
//! sprintcord clear
//! sprintcord status [--json]
//! sprintcord boards [--json]
//! ```
//!
//! Credentials come from the environment (`JIRA_*`, `DISCORD_*`).

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    boards::BoardsArgs, clear::ClearArgs, daemon::DaemonCommand, status::StatusArgs,
    sync::SyncArgs,
};

#[derive(Parser, Debug)]
#[command(
    name = "sprintcord",
    version,
    about = "Keep one Discord thread per issue of the active Jira sprint",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run or control the background sync daemon.
    Daemon {
        #[command(subcommand)]
        command: DaemonCommand,
    },

    /// Run one reconciliation pass now.
    Sync(SyncArgs),

    /// Delete every tracked thread and reset the thread store.
    ///
    /// Stands in for a Discord `/clear` slash command, which sprintcord does
    /// not register. A running daemon performs the clear between passes;
    /// otherwise it runs here.
    Clear(ClearArgs),

    /// Show tracked issue → thread mappings.
    Status(StatusArgs),

    /// List Jira boards visible to the configured credentials.
    Boards(BoardsArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Daemon { command } => commands::daemon::run(command),
        Commands::Sync(args) => args.run(),
        Commands::Clear(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Boards(args) => args.run(),
    }
}

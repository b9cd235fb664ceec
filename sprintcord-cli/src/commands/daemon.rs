//! `sprintcord daemon`: run the scheduler in the foreground, or control a running one.

use anyhow::{Context, Result};
use clap::Subcommand;

use sprintcord_daemon::paths::socket_path;
use sprintcord_daemon::{init_tracing, request_status, request_stop, start_blocking, DaemonError};

use super::{connect, home_dir, load_config};

#[derive(Subcommand, Debug)]
pub enum DaemonCommand {
    /// Log in and run the scheduler and socket server in the foreground.
    Start,
    /// Request graceful daemon shutdown over the Unix socket.
    Stop,
    /// Query daemon runtime status over the Unix socket.
    Status,
}

pub fn run(command: DaemonCommand) -> Result<()> {
    let home = home_dir()?;

    match command {
        DaemonCommand::Start => {
            init_tracing();
            let config = load_config()?;
            let context = connect(&config, &home)?;
            start_blocking(&home, context, config.sync.interval)
                .context("daemon exited with error")?;
        }
        DaemonCommand::Stop => match request_stop(&home) {
            Ok(()) => println!("daemon stop requested"),
            Err(DaemonError::DaemonNotRunning { .. }) => {
                println!("daemon is not running");
            }
            Err(err) => return Err(err).context("failed to stop daemon"),
        },
        DaemonCommand::Status => {
            let payload = match request_status(&home) {
                Ok(status) => status,
                Err(DaemonError::DaemonNotRunning { .. }) => serde_json::json!({
                    "running": false,
                    "socket": socket_path(&home).display().to_string(),
                }),
                Err(err) => return Err(err).context("failed to query daemon status"),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload)
                    .context("failed to render daemon status JSON")?
            );
        }
    }

    Ok(())
}

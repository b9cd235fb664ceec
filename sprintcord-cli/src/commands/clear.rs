//! `sprintcord clear`: delete every tracked thread and reset the store.

use anyhow::{Context, Result};
use clap::Args;

use sprintcord_daemon::{request_clear, DaemonError};

use super::{connect, home_dir, init_cli_tracing, load_config};

#[derive(Args, Debug)]
pub struct ClearArgs {}

impl ClearArgs {
    pub fn run(self) -> Result<()> {
        init_cli_tracing();
        let home = home_dir()?;

        match request_clear(&home) {
            Ok(report) => {
                let message = report["message"]
                    .as_str()
                    .context("daemon clear response has no message")?;
                println!("{message}");
                return Ok(());
            }
            Err(DaemonError::DaemonNotRunning { .. }) => {}
            Err(err) => return Err(err).context("daemon clear failed"),
        }

        let config = load_config()?;
        let context = connect(&config, &home)?;
        let report = context.clear_all();
        for failure in &report.failures {
            eprintln!(
                "could not delete thread {} ({}): {}",
                failure.thread, failure.key, failure.error
            );
        }
        println!("{}", report.message());
        Ok(())
    }
}

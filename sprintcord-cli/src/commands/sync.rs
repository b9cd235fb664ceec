//! `sprintcord sync`: one reconciliation pass, through the daemon when it runs.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use sprintcord_daemon::{request_sync, DaemonError};
use sprintcord_sync::{ItemOutcome, PassReport};

use super::{connect, home_dir, init_cli_tracing, load_config};

/// Arguments for `sprintcord sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        init_cli_tracing();
        let home = home_dir()?;

        match request_sync(&home) {
            Ok(summary) => {
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                } else {
                    println!(
                        "✓ daemon pass: {} created, {} renamed, {} unchanged, {} failed",
                        summary["created"], summary["renamed"], summary["unchanged"], summary["failed"],
                    );
                }
                return Ok(());
            }
            Err(DaemonError::DaemonNotRunning { .. }) => {}
            Err(err) => return Err(err).context("daemon pass failed"),
        }

        let config = load_config()?;
        let context = connect(&config, &home)?;
        let report = context.reconcile_pass().context("sync pass failed")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to render pass report")?
            );
        } else {
            print_report(&report);
        }
        Ok(())
    }
}

fn print_report(report: &PassReport) {
    let Some(sprint) = report.sprint else {
        println!("No active sprint; nothing to do.");
        return;
    };

    println!(
        "✓ sprint {sprint}: {} created, {} renamed, {} unchanged, {} failed",
        report.created(),
        report.renamed(),
        report.unchanged(),
        report.failed(),
    );

    for outcome in &report.outcomes {
        match outcome {
            ItemOutcome::Created { key, name, .. } => {
                println!("  {}  {key}  {name}", "+".green())
            }
            ItemOutcome::Renamed { key, from, to, .. } => {
                println!("  {}  {key}  {from} → {to}", "~".yellow())
            }
            ItemOutcome::Unchanged { key, .. } => println!("  ·  {key}"),
            ItemOutcome::Failed { key, error } => {
                println!("  {}  {key}  {error}", "✗".red())
            }
        }
    }

    if let Some(err) = &report.save_error {
        println!("{} thread store not saved: {err}", "!".red());
    }
}

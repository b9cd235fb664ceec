//! `sprintcord status`: tracked issue → thread mappings from the state file.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use sprintcord_sync::{thread_store, LoadOutcome};

use super::{home_dir, state_path};

/// Arguments for `sprintcord status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct StatusJson {
    state_path: String,
    state: String,
    tracked: Vec<TrackedJson>,
}

#[derive(Serialize, Tabled)]
struct TrackedJson {
    #[tabled(rename = "issue")]
    key: String,
    #[tabled(rename = "thread")]
    thread: String,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let path = state_path(&home);
        let (map, outcome) = thread_store::load_at(&path);

        let state = match &outcome {
            LoadOutcome::Loaded { .. } => "loaded".to_string(),
            LoadOutcome::Missing => "missing".to_string(),
            LoadOutcome::Corrupt { reason } => format!("corrupt: {reason}"),
        };
        let rows: Vec<TrackedJson> = map
            .into_iter()
            .map(|(key, thread)| TrackedJson {
                key: key.0,
                thread: thread.0,
            })
            .collect();

        if self.json {
            let report = StatusJson {
                state_path: path.display().to_string(),
                state,
                tracked: rows,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to render status JSON")?
            );
            return Ok(());
        }

        println!(
            "sprintcord v{} | {} tracked | {}",
            env!("CARGO_PKG_VERSION"),
            rows.len(),
            path.display().to_string().bright_black(),
        );
        if let LoadOutcome::Corrupt { .. } = outcome {
            println!("{} state file unreadable ({state}); treated as empty", "!".red());
        }
        if rows.is_empty() {
            println!("No threads tracked.");
            return Ok(());
        }

        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}

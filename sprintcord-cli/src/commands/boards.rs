//! `sprintcord boards`: list boards visible to the Jira credentials.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use sprintcord_jira::JiraClient;

use super::{init_cli_tracing, load_config};

#[derive(Args, Debug)]
pub struct BoardsArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct BoardRow {
    id: u64,
    name: String,
    #[tabled(rename = "type")]
    kind: String,
    #[tabled(rename = "")]
    configured: String,
}

impl BoardsArgs {
    pub fn run(self) -> Result<()> {
        init_cli_tracing();
        let config = load_config()?;
        let client = JiraClient::new(&config.jira, config.sync.http_timeout);
        let boards = client.list_boards().context("failed to list Jira boards")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&boards).context("failed to render boards JSON")?
            );
            return Ok(());
        }

        if boards.is_empty() {
            println!("No boards visible to {}.", config.jira.email);
            return Ok(());
        }

        let configured = config.jira.board_id.as_str();
        let rows: Vec<BoardRow> = boards
            .into_iter()
            .map(|board| BoardRow {
                configured: if board.id.to_string() == configured {
                    "← configured".green().to_string()
                } else {
                    String::new()
                },
                id: board.id,
                name: board.name,
                kind: board.kind,
            })
            .collect();

        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}

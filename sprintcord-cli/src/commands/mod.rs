pub mod boards;
pub mod clear;
pub mod daemon;
pub mod status;
pub mod sync;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use sprintcord_core::config::ENV_STATE_PATH;
use sprintcord_core::Config;
use sprintcord_discord::DiscordClient;
use sprintcord_jira::JiraClient;
use sprintcord_sync::{thread_store, SyncContext, SyncTarget, ThreadPolicy, ThreadStore};

pub(crate) fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("could not determine home directory")
}

pub(crate) fn load_config() -> Result<Config> {
    Config::from_env().context("configuration is incomplete")
}

/// State file location without requiring the rest of the configuration.
pub(crate) fn state_path(home: &Path) -> PathBuf {
    match std::env::var(ENV_STATE_PATH) {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value.trim()),
        _ => thread_store::store_path_at(home),
    }
}

/// Build both gateways, log in, and open the store.
pub(crate) fn connect(config: &Config, home: &Path) -> Result<SyncContext> {
    let timeout = config.sync.http_timeout;
    let tracker = JiraClient::new(&config.jira, timeout);
    let threads =
        DiscordClient::login(&config.discord, timeout).context("discord login failed")?;

    let path = config
        .sync
        .state_path
        .clone()
        .unwrap_or_else(|| thread_store::store_path_at(home));
    let (store, _) = ThreadStore::open(path);

    Ok(SyncContext::new(
        Arc::new(tracker),
        Arc::new(threads),
        SyncTarget {
            board: config.jira.board_id.clone(),
            channel: config.discord.channel_id.clone(),
        },
        ThreadPolicy::from_settings(&config.sync),
        store,
    ))
}

/// Subscriber for one-shot commands: quiet unless `RUST_LOG` says otherwise.
pub(crate) fn init_cli_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

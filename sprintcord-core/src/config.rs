//! Environment configuration.
//!
//! Everything is read once at startup. Missing required variables are
//! collected and reported together so a misconfigured deployment fails on the
//! first run instead of one variable at a time.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::types::{BoardId, ChannelId, UserId};

pub const ENV_JIRA_BASE_URL: &str = "JIRA_BASE_URL";
pub const ENV_JIRA_EMAIL: &str = "JIRA_EMAIL";
pub const ENV_JIRA_API_TOKEN: &str = "JIRA_API_TOKEN";
pub const ENV_JIRA_BOARD_ID: &str = "JIRA_BOARD_ID";
pub const ENV_DISCORD_CHANNEL_ID: &str = "DISCORD_CHANNEL_ID";
pub const ENV_DISCORD_TOKEN: &str = "DISCORD_TOKEN";
pub const ENV_DISCORD_API_BASE: &str = "DISCORD_API_BASE";
pub const ENV_SYNC_INTERVAL_SECS: &str = "SPRINTCORD_SYNC_INTERVAL_SECS";
pub const ENV_AUTO_ARCHIVE_MINUTES: &str = "SPRINTCORD_AUTO_ARCHIVE_MINUTES";
pub const ENV_THREAD_MEMBERS: &str = "SPRINTCORD_THREAD_MEMBERS";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "SPRINTCORD_HTTP_TIMEOUT_SECS";
pub const ENV_STATE_PATH: &str = "SPRINTCORD_STATE_PATH";

pub const DEFAULT_DISCORD_API_BASE: &str = "https://discord.com/api/v10";
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(15);
pub const DEFAULT_AUTO_ARCHIVE_MINUTES: u32 = 1440;
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Auto-archive durations the platform accepts, in minutes.
pub const AUTO_ARCHIVE_CHOICES: [u32; 4] = [60, 1440, 4320, 10080];

/// Tracker credentials and board selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JiraSettings {
    pub base_url: String,
    pub email: String,
    pub api_token: String,
    pub board_id: BoardId,
}

/// Bot credentials and target channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscordSettings {
    pub api_base: String,
    pub bot_token: String,
    pub channel_id: ChannelId,
}

/// Scheduler and thread-creation policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub interval: Duration,
    pub auto_archive_minutes: u32,
    /// Users added to every newly created thread.
    pub thread_members: Vec<UserId>,
    pub http_timeout: Duration,
    /// Overrides the default `~/.sprintcord/threads.json`.
    pub state_path: Option<PathBuf>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SYNC_INTERVAL,
            auto_archive_minutes: DEFAULT_AUTO_ARCHIVE_MINUTES,
            thread_members: Vec::new(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            state_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub jira: JiraSettings,
    pub discord: DiscordSettings,
    pub sync: SyncSettings,
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load through an arbitrary lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut missing = Vec::new();
        let mut required = |var: &'static str| {
            let value = get(var);
            if value.is_none() {
                missing.push(var);
            }
            value.unwrap_or_default()
        };

        let base_url = required(ENV_JIRA_BASE_URL);
        let email = required(ENV_JIRA_EMAIL);
        let api_token = required(ENV_JIRA_API_TOKEN);
        let board_id = required(ENV_JIRA_BOARD_ID);
        let channel_id = required(ENV_DISCORD_CHANNEL_ID);
        let bot_token = required(ENV_DISCORD_TOKEN);

        if !missing.is_empty() {
            return Err(ConfigError::Missing { vars: missing });
        }

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                var: ENV_JIRA_BASE_URL,
                reason: format!("expected an http(s) URL, got '{base_url}'"),
            });
        }
        if !channel_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::Invalid {
                var: ENV_DISCORD_CHANNEL_ID,
                reason: format!("expected a numeric channel id, got '{channel_id}'"),
            });
        }

        let interval = match get(ENV_SYNC_INTERVAL_SECS) {
            Some(raw) => Duration::from_secs(parse_positive(ENV_SYNC_INTERVAL_SECS, &raw)?),
            None => DEFAULT_SYNC_INTERVAL,
        };
        let http_timeout = match get(ENV_HTTP_TIMEOUT_SECS) {
            Some(raw) => Duration::from_secs(parse_positive(ENV_HTTP_TIMEOUT_SECS, &raw)?),
            None => DEFAULT_HTTP_TIMEOUT,
        };
        let auto_archive_minutes = match get(ENV_AUTO_ARCHIVE_MINUTES) {
            Some(raw) => parse_auto_archive(&raw)?,
            None => DEFAULT_AUTO_ARCHIVE_MINUTES,
        };
        let thread_members = match get(ENV_THREAD_MEMBERS) {
            Some(raw) => parse_members(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            jira: JiraSettings {
                base_url: base_url.trim_end_matches('/').to_string(),
                email,
                api_token,
                board_id: BoardId(board_id),
            },
            discord: DiscordSettings {
                api_base: get(ENV_DISCORD_API_BASE)
                    .unwrap_or_else(|| DEFAULT_DISCORD_API_BASE.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                bot_token,
                channel_id: ChannelId(channel_id),
            },
            sync: SyncSettings {
                interval,
                auto_archive_minutes,
                thread_members,
                http_timeout,
                state_path: get(ENV_STATE_PATH).map(PathBuf::from),
            },
        })
    }
}

fn parse_positive(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            var,
            reason: "must be at least 1".to_string(),
        }),
        Ok(value) => Ok(value),
        Err(err) => Err(ConfigError::Invalid {
            var,
            reason: format!("'{raw}' is not a whole number: {err}"),
        }),
    }
}

fn parse_auto_archive(raw: &str) -> Result<u32, ConfigError> {
    let minutes = raw.parse::<u32>().map_err(|err| ConfigError::Invalid {
        var: ENV_AUTO_ARCHIVE_MINUTES,
        reason: format!("'{raw}' is not a whole number: {err}"),
    })?;
    if !AUTO_ARCHIVE_CHOICES.contains(&minutes) {
        return Err(ConfigError::Invalid {
            var: ENV_AUTO_ARCHIVE_MINUTES,
            reason: format!("{minutes} is not one of {AUTO_ARCHIVE_CHOICES:?}"),
        });
    }
    Ok(minutes)
}

fn parse_members(raw: &str) -> Result<Vec<UserId>, ConfigError> {
    let mut members = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if !part.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::Invalid {
                var: ENV_THREAD_MEMBERS,
                reason: format!("'{part}' is not a numeric user id"),
            });
        }
        let id = UserId::from(part);
        if !members.contains(&id) {
            members.push(id);
        }
    }
    Ok(members)
}

//! Environment configuration loading.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use sprintcord_core::config::{
    DEFAULT_AUTO_ARCHIVE_MINUTES, DEFAULT_DISCORD_API_BASE, DEFAULT_HTTP_TIMEOUT,
    DEFAULT_SYNC_INTERVAL,
};
use sprintcord_core::{ChannelId, Config, ConfigError, UserId};

fn base_env() -> HashMap<&'static str, String> {
    [
        ("JIRA_BASE_URL", "https://acme.atlassian.net/"),
        ("JIRA_EMAIL", "ops@acme.test"),
        ("JIRA_API_TOKEN", "token-123"),
        ("JIRA_BOARD_ID", "42"),
        ("DISCORD_CHANNEL_ID", "998877"),
        ("DISCORD_TOKEN", "bot-secret"),
    ]
    .into_iter()
    .map(|(k, v)| (k, v.to_string()))
    .collect()
}

fn load(env: &HashMap<&'static str, String>) -> Result<Config, ConfigError> {
    Config::from_lookup(|var| env.get(var).cloned())
}

#[test]
fn required_values_and_defaults() {
    let config = load(&base_env()).expect("config");

    assert_eq!(config.jira.base_url, "https://acme.atlassian.net");
    assert_eq!(config.jira.email, "ops@acme.test");
    assert_eq!(config.jira.board_id.as_str(), "42");
    assert_eq!(config.discord.channel_id, ChannelId::from("998877"));
    assert_eq!(config.discord.api_base, DEFAULT_DISCORD_API_BASE);
    assert_eq!(config.sync.interval, DEFAULT_SYNC_INTERVAL);
    assert_eq!(config.sync.interval, Duration::from_secs(15));
    assert_eq!(config.sync.auto_archive_minutes, DEFAULT_AUTO_ARCHIVE_MINUTES);
    assert_eq!(config.sync.http_timeout, DEFAULT_HTTP_TIMEOUT);
    assert!(config.sync.thread_members.is_empty());
    assert!(config.sync.state_path.is_none());
}

#[test]
fn all_missing_variables_are_reported_together() {
    let mut env = base_env();
    env.remove("JIRA_EMAIL");
    env.remove("DISCORD_TOKEN");
    env.insert("JIRA_API_TOKEN", "   ".to_string());

    let err = load(&env).unwrap_err();
    assert_eq!(
        err,
        ConfigError::Missing {
            vars: vec!["JIRA_EMAIL", "JIRA_API_TOKEN", "DISCORD_TOKEN"]
        }
    );
    let msg = err.to_string();
    assert!(msg.contains("JIRA_EMAIL"), "got: {msg}");
    assert!(msg.contains("DISCORD_TOKEN"), "got: {msg}");
}

#[test]
fn optional_overrides_are_parsed() {
    let mut env = base_env();
    env.insert("SPRINTCORD_SYNC_INTERVAL_SECS", "60".to_string());
    env.insert("SPRINTCORD_AUTO_ARCHIVE_MINUTES", "4320".to_string());
    env.insert("SPRINTCORD_THREAD_MEMBERS", "111, 222,,111".to_string());
    env.insert("SPRINTCORD_HTTP_TIMEOUT_SECS", "3".to_string());
    env.insert("SPRINTCORD_STATE_PATH", "/var/lib/sprintcord/threads.json".to_string());
    env.insert("DISCORD_API_BASE", "http://localhost:9000/api/".to_string());

    let config = load(&env).expect("config");
    assert_eq!(config.sync.interval, Duration::from_secs(60));
    assert_eq!(config.sync.auto_archive_minutes, 4320);
    assert_eq!(
        config.sync.thread_members,
        vec![UserId::from("111"), UserId::from("222")]
    );
    assert_eq!(config.sync.http_timeout, Duration::from_secs(3));
    assert_eq!(
        config.sync.state_path,
        Some(PathBuf::from("/var/lib/sprintcord/threads.json"))
    );
    assert_eq!(config.discord.api_base, "http://localhost:9000/api");
}

#[test]
fn zero_interval_is_rejected() {
    let mut env = base_env();
    env.insert("SPRINTCORD_SYNC_INTERVAL_SECS", "0".to_string());
    let err = load(&env).unwrap_err();
    assert!(
        matches!(err, ConfigError::Invalid { var: "SPRINTCORD_SYNC_INTERVAL_SECS", .. }),
        "got: {err}"
    );
}

#[test]
fn unsupported_archive_duration_is_rejected() {
    let mut env = base_env();
    env.insert("SPRINTCORD_AUTO_ARCHIVE_MINUTES", "30".to_string());
    let err = load(&env).unwrap_err();
    assert!(err.to_string().contains("SPRINTCORD_AUTO_ARCHIVE_MINUTES"));
}

#[test]
fn non_numeric_channel_and_member_ids_are_rejected() {
    let mut env = base_env();
    env.insert("DISCORD_CHANNEL_ID", "#general".to_string());
    assert!(matches!(
        load(&env).unwrap_err(),
        ConfigError::Invalid { var: "DISCORD_CHANNEL_ID", .. }
    ));

    let mut env = base_env();
    env.insert("SPRINTCORD_THREAD_MEMBERS", "CHANGEME".to_string());
    assert!(matches!(
        load(&env).unwrap_err(),
        ConfigError::Invalid { var: "SPRINTCORD_THREAD_MEMBERS", .. }
    ));
}

#[test]
fn base_url_must_be_http() {
    let mut env = base_env();
    env.insert("JIRA_BASE_URL", "acme.atlassian.net".to_string());
    assert!(matches!(
        load(&env).unwrap_err(),
        ConfigError::Invalid { var: "JIRA_BASE_URL", .. }
    ));
}

//! Blocking Discord client.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use sprintcord_core::{
    ChannelId, DiscordSettings, GatewayError, Thread, ThreadGateway, ThreadId, UserId,
};

use crate::models::{ActiveThreads, Channel, CurrentUser, Message};

const SERVICE: &str = "discord";
const USER_AGENT: &str = concat!("DiscordBot (sprintcord, ", env!("CARGO_PKG_VERSION"), ")");
const MAX_ERROR_BODY: usize = 512;

/// Anchor message posted in the channel; each new thread starts from one.
pub fn starter_message_body(name: &str) -> Value {
    json!({ "content": format!("Creating thread for **{name}**") })
}

/// Body for `POST /channels/{id}/messages/{message}/threads`.
pub fn create_thread_body(name: &str, auto_archive_minutes: u32) -> Value {
    json!({
        "name": name,
        "auto_archive_duration": auto_archive_minutes,
    })
}

pub fn messages_path(channel: &ChannelId) -> String {
    format!("/channels/{channel}/messages")
}

pub fn message_thread_path(channel: &ChannelId, message: &str) -> String {
    format!("/channels/{channel}/messages/{message}/threads")
}

/// Body for `PATCH /channels/{id}`. Archived threads are reopened in the
/// same request.
pub fn rename_thread_body(thread: &Thread, name: &str) -> Value {
    if thread.archived {
        json!({ "name": name, "archived": false })
    } else {
        json!({ "name": name })
    }
}

pub struct DiscordClient {
    http: Http,
    guild_id: String,
}

impl DiscordClient {
    /// Check the token and the target channel.
    ///
    /// Fails when the token is rejected or when `channel_id` is not a guild
    /// text channel.
    pub fn login(settings: &DiscordSettings, timeout: Duration) -> Result<Self, GatewayError> {
        let http = Http {
            agent: ureq::AgentBuilder::new()
                .timeout(timeout)
                .user_agent(USER_AGENT)
                .build(),
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            auth: format!("Bot {}", settings.bot_token),
        };

        let user: CurrentUser = http.get_json("/users/@me")?;
        let channel: Channel = http.get_json(&format!("/channels/{}", settings.channel_id))?;
        let guild_id = channel.text_channel_guild()?.to_string();

        tracing::info!(
            user = %user.username,
            guild = %guild_id,
            channel = %settings.channel_id,
            "logged in to discord",
        );
        Ok(Self { http, guild_id })
    }
}

struct Http {
    agent: ureq::Agent,
    api_base: String,
    auth: String,
}

impl Http {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let url = self.url(path);
        let response = self
            .agent
            .get(&url)
            .set("Authorization", &self.auth)
            .call()
            .map_err(|err| map_ureq_error(&url, err))?;
        decode(&url, response)
    }

    fn send_json<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        body: Value,
    ) -> Result<T, GatewayError> {
        let url = self.url(path);
        let response = self
            .agent
            .request(method, &url)
            .set("Authorization", &self.auth)
            .send_json(body)
            .map_err(|err| map_ureq_error(&url, err))?;
        decode(&url, response)
    }

    /// Requests whose response body is irrelevant.
    fn send_empty(&self, method: &str, path: &str) -> Result<(), GatewayError> {
        let url = self.url(path);
        self.agent
            .request(method, &url)
            .set("Authorization", &self.auth)
            .send_bytes(&[])
            .map_err(|err| map_ureq_error(&url, err))?;
        Ok(())
    }
}

impl ThreadGateway for DiscordClient {
    fn fetch_thread(&self, id: &ThreadId) -> Result<Thread, GatewayError> {
        let channel: Channel = self.http.get_json(&format!("/channels/{id}"))?;
        channel.into_thread()
    }

    fn fetch_active_threads(&self, channel: &ChannelId) -> Result<Vec<Thread>, GatewayError> {
        let active: ActiveThreads =
            self.http.get_json(&format!("/guilds/{}/threads/active", self.guild_id))?;
        let threads = active.in_parent(channel);
        tracing::debug!(channel = %channel, count = threads.len(), "listed active threads");
        Ok(threads)
    }

    fn create_thread(
        &self,
        channel: &ChannelId,
        name: &str,
        auto_archive_minutes: u32,
    ) -> Result<Thread, GatewayError> {
        let starter: Message =
            self.http.send_json("POST", &messages_path(channel), starter_message_body(name))?;
        let created: Result<Channel, _> = self.http.send_json(
            "POST",
            &message_thread_path(channel, &starter.id),
            create_thread_body(name, auto_archive_minutes),
        );
        match created {
            Ok(created) => created.into_thread(),
            Err(err) => {
                // The next pass posts a fresh anchor.
                let path = format!("{}/{}", messages_path(channel), starter.id);
                if let Err(cleanup) = self.http.send_empty("DELETE", &path) {
                    tracing::warn!(
                        channel = %channel,
                        starter = %starter.id,
                        error = %cleanup,
                        "failed to delete starter message",
                    );
                }
                Err(err)
            }
        }
    }

    fn rename_thread(&self, thread: &Thread, name: &str) -> Result<(), GatewayError> {
        let _: Channel = self.http.send_json(
            "PATCH",
            &format!("/channels/{}", thread.id),
            rename_thread_body(thread, name),
        )?;
        Ok(())
    }

    fn delete_thread(&self, id: &ThreadId) -> Result<(), GatewayError> {
        self.http.send_empty("DELETE", &format!("/channels/{id}"))
    }

    fn add_member(&self, thread: &ThreadId, user: &UserId) -> Result<(), GatewayError> {
        self.http.send_empty("PUT", &format!("/channels/{thread}/thread-members/{user}"))
    }
}

fn decode<T: DeserializeOwned>(url: &str, response: ureq::Response) -> Result<T, GatewayError> {
    let body = response
        .into_string()
        .map_err(|err| GatewayError::Transport {
            service: SERVICE,
            url: url.to_string(),
            message: err.to_string(),
        })?;
    serde_json::from_str(&body).map_err(|err| GatewayError::Decode {
        service: SERVICE,
        url: url.to_string(),
        message: err.to_string(),
    })
}

fn map_ureq_error(url: &str, err: ureq::Error) -> GatewayError {
    match err {
        ureq::Error::Status(status, response) => {
            let body: String = response
                .into_string()
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY)
                .collect();
            GatewayError::Status {
                service: SERVICE,
                url: url.to_string(),
                status,
                body,
            }
        }
        ureq::Error::Transport(transport) => GatewayError::Transport {
            service: SERVICE,
            url: url.to_string(),
            message: transport.to_string(),
        },
    }
}

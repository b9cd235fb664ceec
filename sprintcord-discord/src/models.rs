//! Discord channel and user objects, trimmed to what the sync reads.

use serde::Deserialize;

use sprintcord_core::{ChannelId, GatewayError, Thread, ThreadId};

pub const GUILD_TEXT: u8 = 0;
pub const ANNOUNCEMENT_THREAD: u8 = 10;
pub const PUBLIC_THREAD: u8 = 11;
pub const PRIVATE_THREAD: u8 = 12;

/// `GET /users/@me`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub bot: bool,
}

/// A channel object. Threads are channels with a thread type and metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub thread_metadata: Option<ThreadMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ThreadMetadata {
    #[serde(default)]
    pub archived: bool,
}

impl Channel {
    pub fn is_thread(&self) -> bool {
        matches!(self.kind, ANNOUNCEMENT_THREAD | PUBLIC_THREAD | PRIVATE_THREAD)
    }

    /// Guild of a text channel that threads can be created in.
    pub fn text_channel_guild(&self) -> Result<&str, GatewayError> {
        if self.kind != GUILD_TEXT {
            return Err(GatewayError::Rejected(format!(
                "channel {} has type {}, expected a guild text channel",
                self.id, self.kind
            )));
        }
        self.guild_id
            .as_deref()
            .ok_or_else(|| GatewayError::Rejected(format!("channel {} has no guild", self.id)))
    }

    pub fn into_thread(self) -> Result<Thread, GatewayError> {
        if !self.is_thread() {
            return Err(GatewayError::NotFound(format!(
                "channel {} is not a thread (type {})",
                self.id, self.kind
            )));
        }
        Ok(Thread {
            id: ThreadId(self.id),
            name: self.name.unwrap_or_default(),
            parent_id: self.parent_id.map(ChannelId),
            archived: self.thread_metadata.map(|m| m.archived).unwrap_or(false),
        })
    }
}

/// `GET /guilds/{guild}/threads/active`.
#[derive(Debug, Clone, Deserialize)]
pub struct ActiveThreads {
    #[serde(default)]
    pub threads: Vec<Channel>,
}

impl ActiveThreads {
    /// Threads of this response that hang off `parent`.
    pub fn in_parent(self, parent: &ChannelId) -> Vec<Thread> {
        self.threads
            .into_iter()
            .filter(|c| c.parent_id.as_deref() == Some(parent.as_str()))
            .filter_map(|c| c.into_thread().ok())
            .collect()
    }
}

/// A posted message; only the id is needed to start a thread from it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    pub id: String,
}

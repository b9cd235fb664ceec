//! sprintcord core library: domain types, status classifier, gateway seams,
//! configuration and errors.
//!
//! - [`types`]: identifiers, [`WorkItem`], [`Thread`], desired thread names
//! - [`status`]: [`StatusMarker`] classifier
//! - [`gateway`]: [`TrackerGateway`] / [`ThreadGateway`] traits
//! - [`config`]: environment [`Config`]
//! - [`error`]: [`ConfigError`], [`GatewayError`]

pub mod config;
pub mod error;
pub mod gateway;
pub mod status;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::{Config, DiscordSettings, JiraSettings, SyncSettings};
pub use error::{ConfigError, GatewayError};
pub use gateway::{ThreadGateway, TrackerGateway};
pub use status::StatusMarker;
pub use types::{
    desired_thread_name, name_leads_with_key, name_mentions_key, BoardId, ChannelId, IssueKey,
    SprintId, Thread, ThreadId, UserId, WorkItem,
};

//! # sprintcord-discord
//!
//! Thread gateway over the Discord REST API (v10) with a bot token.
//!
//! [`DiscordClient::login`] verifies the token and the target channel before
//! any thread call is made; a client that exists is a client that logged in.

pub mod client;
pub mod models;

pub use client::{
    create_thread_body, message_thread_path, messages_path, rename_thread_body,
    starter_message_body, DiscordClient,
};
pub use models::{ActiveThreads, Channel, CurrentUser, Message};

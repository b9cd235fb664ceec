//! # sprintcord-jira
//!
//! Tracker gateway over the Jira Agile REST API.

pub mod client;
pub mod models;

pub use client::{basic_auth_header, boards_url, issues_url, sprints_url, JiraClient};
pub use models::{Board, BoardPage, IssuePage, Sprint, SprintPage};

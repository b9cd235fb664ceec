//! # sprintcord-sync
//!
//! Thread store and reconciliation engine.
//!
//! Build a [`SyncContext`] once at startup, then call
//! [`SyncContext::reconcile_pass`] on every tick and
//! [`SyncContext::clear_all`] for the manual reset.

pub mod clear;
pub mod context;
pub mod error;
pub mod reconcile;
pub mod thread_store;

pub use clear::{ClearReport, DeleteFailure};
pub use context::{SyncContext, SyncTarget};
pub use error::SyncError;
pub use reconcile::{ItemOutcome, PassReport, Resolution, ThreadPolicy};
pub use thread_store::{LoadOutcome, ThreadMap, ThreadStore};

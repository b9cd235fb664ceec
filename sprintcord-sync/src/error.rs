//! Error types for sprintcord-sync.

use std::path::PathBuf;

use thiserror::Error;

use sprintcord_core::{GatewayError, SprintId};

/// Errors that abort a whole reconciliation pass or a store write.
///
/// Per-item gateway failures never surface here; they are recorded in the
/// pass report instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The board's active sprint could not be resolved.
    #[error("active sprint lookup failed: {0}")]
    SprintLookup(#[source] GatewayError),

    /// The sprint's issue list could not be fetched.
    #[error("fetching issues for sprint {sprint} failed: {source}")]
    IssueFetch {
        sprint: SprintId,
        #[source]
        source: GatewayError,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error (thread store).
    #[error("thread store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

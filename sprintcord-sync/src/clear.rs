//! Manual reset: delete every tracked thread and empty the store.

use serde::Serialize;

use sprintcord_core::{IssueKey, ThreadGateway, ThreadId};

use crate::thread_store::ThreadStore;

/// One thread that could not be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteFailure {
    pub key: IssueKey,
    pub thread: ThreadId,
    pub error: String,
}

/// Result of [`clear_all`](crate::SyncContext::clear_all).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClearReport {
    /// Threads actually deleted.
    pub deleted: usize,
    pub failures: Vec<DeleteFailure>,
    /// Whether the emptied store was written to disk.
    pub store_saved: bool,
}

impl ClearReport {
    /// Short acknowledgement for the command surface.
    pub fn message(&self) -> String {
        format!("Deleted {} thread(s).", self.deleted)
    }
}

/// Delete each tracked thread independently, then persist an empty store no
/// matter how many deletions succeeded.
pub(crate) fn clear_all(threads: &dyn ThreadGateway, store: &mut ThreadStore) -> ClearReport {
    let previous = store.clear();
    let mut deleted = 0usize;
    let mut failures = Vec::new();

    for (key, thread) in previous {
        match threads.delete_thread(&thread) {
            Ok(()) => {
                deleted += 1;
                tracing::info!(key = %key, thread = %thread, "deleted thread");
            }
            Err(err) => {
                tracing::warn!(key = %key, thread = %thread, error = %err, "could not delete thread");
                failures.push(DeleteFailure {
                    key,
                    thread,
                    error: err.to_string(),
                });
            }
        }
    }

    let store_saved = match store.save() {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(
                path = %store.path().display(),
                error = %err,
                "failed to persist cleared thread store",
            );
            false
        }
    };

    tracing::info!(deleted, failed = failures.len(), "cleared tracked threads");
    ClearReport {
        deleted,
        failures,
        store_saved,
    }
}

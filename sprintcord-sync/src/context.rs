//! Shared sync entrypoint used by the CLI and the daemon.
//!
//! [`SyncContext`] owns everything a pass needs: both gateways, the board and
//! channel pair, the thread policy and the store. Passes and clears take the
//! store lock for their whole duration, so they never interleave.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use sprintcord_core::{BoardId, ChannelId, ThreadGateway, TrackerGateway};

use crate::clear::{self, ClearReport};
use crate::error::SyncError;
use crate::reconcile::{Pass, PassReport, ThreadPolicy};
use crate::thread_store::{ThreadMap, ThreadStore};

/// The single board → channel pair being mirrored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    pub board: BoardId,
    pub channel: ChannelId,
}

pub struct SyncContext {
    tracker: Arc<dyn TrackerGateway>,
    threads: Arc<dyn ThreadGateway>,
    target: SyncTarget,
    policy: ThreadPolicy,
    store: Mutex<ThreadStore>,
}

impl SyncContext {
    pub fn new(
        tracker: Arc<dyn TrackerGateway>,
        threads: Arc<dyn ThreadGateway>,
        target: SyncTarget,
        policy: ThreadPolicy,
        store: ThreadStore,
    ) -> Self {
        Self {
            tracker,
            threads,
            target,
            policy,
            store: Mutex::new(store),
        }
    }

    /// Run one reconciliation pass.
    pub fn reconcile_pass(&self) -> Result<PassReport, SyncError> {
        let mut store = self.lock_store();
        Pass {
            tracker: self.tracker.as_ref(),
            threads: self.threads.as_ref(),
            board: &self.target.board,
            channel: &self.target.channel,
            policy: &self.policy,
        }
        .run(&mut store)
    }

    /// Delete every tracked thread and reset the store.
    pub fn clear_all(&self) -> ClearReport {
        let mut store = self.lock_store();
        clear::clear_all(self.threads.as_ref(), &mut store)
    }

    /// Snapshot of the current mapping.
    pub fn tracked(&self) -> ThreadMap {
        self.lock_store().entries().clone()
    }

    pub fn store_path(&self) -> PathBuf {
        self.lock_store().path().to_path_buf()
    }

    pub fn target(&self) -> &SyncTarget {
        &self.target
    }

    // A panic mid-pass leaves the map in a usable state; the file is only
    // replaced by a complete snapshot.
    fn lock_store(&self) -> MutexGuard<'_, ThreadStore> {
        self.store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

//! Reconciliation pass: active sprint issues → channel threads.
//!
//! ## Per-item protocol
//!
//! 1. Classify the status and build the desired thread name.
//! 2. Tier 1: the store holds a handle → fetch that thread. Any failure, or a
//!    thread parented to a different channel, falls through to tier 2.
//! 3. Tier 2: scan the channel's active threads for a name mentioning the key.
//!    Threads already recorded under another key are skipped, and a name of
//!    the form `<marker> KEY:` wins over a mere mention. The listing is
//!    fetched at most once per pass.
//! 4. Resolved → record the handle, rename only if the name differs.
//! 5. Unresolved → create the thread, record it, add configured members
//!    (best effort).
//!
//! Item failures are logged and reported; they never abort the pass. The
//! store is written once, after every item has been processed.

use std::collections::HashSet;

use serde::Serialize;

use sprintcord_core::{
    desired_thread_name, name_leads_with_key, name_mentions_key, BoardId, ChannelId, GatewayError,
    IssueKey, SprintId, StatusMarker, SyncSettings, Thread, ThreadGateway, ThreadId, TrackerGateway,
    UserId, WorkItem,
};

use crate::error::SyncError;
use crate::thread_store::ThreadStore;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// How an existing thread was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Via the handle recorded in the thread store.
    StoredHandle,
    /// Via the key embedded in an active thread's name.
    NameScan,
}

/// Outcome of reconciling one work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// No thread existed; one was created.
    Created {
        key: IssueKey,
        thread: ThreadId,
        name: String,
    },
    /// An existing thread was renamed to the desired name.
    Renamed {
        key: IssueKey,
        thread: ThreadId,
        via: Resolution,
        from: String,
        to: String,
    },
    /// An existing thread already carried the desired name.
    Unchanged {
        key: IssueKey,
        thread: ThreadId,
        via: Resolution,
    },
    /// A gateway call for this item failed; retried next pass.
    Failed { key: IssueKey, error: String },
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassReport {
    /// `None` when the board had no active sprint and the pass was skipped.
    pub sprint: Option<SprintId>,
    pub outcomes: Vec<ItemOutcome>,
    /// Whether the store snapshot was written at the end of the pass.
    pub store_saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_error: Option<String>,
}

impl PassReport {
    fn skipped() -> Self {
        Self {
            sprint: None,
            outcomes: Vec::new(),
            store_saved: false,
            save_error: None,
        }
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Created { .. }))
    }

    pub fn renamed(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Renamed { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Unchanged { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// How new threads are created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadPolicy {
    pub auto_archive_minutes: u32,
    /// Added to each newly created thread; failures are logged only.
    pub members: Vec<UserId>,
}

impl ThreadPolicy {
    pub fn from_settings(settings: &SyncSettings) -> Self {
        Self {
            auto_archive_minutes: settings.auto_archive_minutes,
            members: settings.thread_members.clone(),
        }
    }
}

impl Default for ThreadPolicy {
    fn default() -> Self {
        Self::from_settings(&SyncSettings::default())
    }
}

// ---------------------------------------------------------------------------
// Pass
// ---------------------------------------------------------------------------

pub(crate) struct Pass<'a> {
    pub tracker: &'a dyn TrackerGateway,
    pub threads: &'a dyn ThreadGateway,
    pub board: &'a BoardId,
    pub channel: &'a ChannelId,
    pub policy: &'a ThreadPolicy,
}

impl Pass<'_> {
    /// Run one pass against `store`, persisting it at the end.
    ///
    /// Returns `Err` only when the sprint or its issue list cannot be fetched,
    /// in which case `store` has not been touched.
    pub(crate) fn run(&self, store: &mut ThreadStore) -> Result<PassReport, SyncError> {
        let Some(sprint) = self
            .tracker
            .active_sprint_id(self.board)
            .map_err(SyncError::SprintLookup)?
        else {
            tracing::info!(board = %self.board, "no active sprint; skipping pass");
            return Ok(PassReport::skipped());
        };

        let items = self
            .tracker
            .sprint_issues(sprint)
            .map_err(|source| SyncError::IssueFetch { sprint, source })?;
        tracing::debug!(sprint = %sprint, items = items.len(), "fetched sprint issues");

        let mut active = ActiveThreads::default();
        let mut seen = HashSet::new();
        let mut outcomes = Vec::with_capacity(items.len());

        for item in &items {
            if !seen.insert(item.key.clone()) {
                tracing::debug!(key = %item.key, "duplicate issue in sprint listing; skipping");
                continue;
            }
            let outcome = match self.reconcile_item(item, &mut active, store) {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::warn!(key = %item.key, error = %err, "failed to reconcile issue");
                    ItemOutcome::Failed {
                        key: item.key.clone(),
                        error: err.to_string(),
                    }
                }
            };
            outcomes.push(outcome);
        }

        let (store_saved, save_error) = match store.save() {
            Ok(()) => (true, None),
            Err(err) => {
                tracing::warn!(
                    path = %store.path().display(),
                    error = %err,
                    "failed to persist thread store; will retry next pass",
                );
                (false, Some(err.to_string()))
            }
        };

        Ok(PassReport {
            sprint: Some(sprint),
            outcomes,
            store_saved,
            save_error,
        })
    }

    fn reconcile_item(
        &self,
        item: &WorkItem,
        active: &mut ActiveThreads,
        store: &mut ThreadStore,
    ) -> Result<ItemOutcome, GatewayError> {
        let marker = StatusMarker::classify(&item.status);
        let desired = desired_thread_name(marker, &item.key, &item.summary);
        tracing::debug!(key = %item.key, status = %item.status, marker = %marker, "classified issue");

        let Some((thread, via)) = self.resolve(item, active, store)? else {
            return self.create(item, desired, active, store);
        };

        // Record before renaming so a failed rename still leaves the handle.
        store.insert(item.key.clone(), thread.id.clone());

        if thread.name == desired {
            tracing::debug!(key = %item.key, thread = %thread.id, "thread name already current");
            return Ok(ItemOutcome::Unchanged {
                key: item.key.clone(),
                thread: thread.id,
                via,
            });
        }

        self.threads.rename_thread(&thread, &desired)?;
        active.renamed(&thread.id, &desired);
        tracing::info!(
            key = %item.key,
            thread = %thread.id,
            from = %thread.name,
            to = %desired,
            "renamed thread",
        );
        Ok(ItemOutcome::Renamed {
            key: item.key.clone(),
            thread: thread.id,
            via,
            from: thread.name,
            to: desired,
        })
    }

    fn resolve(
        &self,
        item: &WorkItem,
        active: &mut ActiveThreads,
        store: &ThreadStore,
    ) -> Result<Option<(Thread, Resolution)>, GatewayError> {
        if let Some(id) = store.get(&item.key) {
            match self.threads.fetch_thread(id) {
                Ok(thread) if self.in_channel(&thread) => {
                    return Ok(Some((thread, Resolution::StoredHandle)));
                }
                Ok(thread) => {
                    tracing::info!(
                        key = %item.key,
                        thread = %thread.id,
                        "stored thread belongs to another channel; falling back to name scan",
                    );
                }
                Err(err) if err.is_not_found() => {
                    tracing::info!(
                        key = %item.key,
                        thread = %id,
                        "stored thread handle is stale; falling back to name scan",
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        key = %item.key,
                        thread = %id,
                        error = %err,
                        "could not fetch stored thread; falling back to name scan",
                    );
                }
            }
        }

        // Covers handles recorded earlier in this pass too.
        let claimed: HashSet<&ThreadId> = store
            .entries()
            .iter()
            .filter(|(key, _)| *key != &item.key)
            .map(|(_, id)| id)
            .collect();
        let candidates: Vec<&Thread> = active
            .list(self.threads, self.channel)?
            .iter()
            .filter(|t| !claimed.contains(&t.id) && name_mentions_key(&t.name, &item.key))
            .collect();
        let found = candidates
            .iter()
            .find(|t| name_leads_with_key(&t.name, &item.key))
            .or_else(|| candidates.first())
            .map(|t| (*t).clone());
        Ok(found.map(|thread| (thread, Resolution::NameScan)))
    }

    fn create(
        &self,
        item: &WorkItem,
        desired: String,
        active: &mut ActiveThreads,
        store: &mut ThreadStore,
    ) -> Result<ItemOutcome, GatewayError> {
        let thread =
            self.threads
                .create_thread(self.channel, &desired, self.policy.auto_archive_minutes)?;
        store.insert(item.key.clone(), thread.id.clone());
        tracing::info!(key = %item.key, thread = %thread.id, name = %desired, "created thread");

        for user in &self.policy.members {
            match self.threads.add_member(&thread.id, user) {
                Ok(()) => tracing::info!(thread = %thread.id, user = %user, "added member to thread"),
                Err(err) => tracing::warn!(
                    thread = %thread.id,
                    user = %user,
                    error = %err,
                    "failed to add member to thread",
                ),
            }
        }

        let id = thread.id.clone();
        active.push(thread);
        Ok(ItemOutcome::Created {
            key: item.key.clone(),
            thread: id,
            name: desired,
        })
    }

    fn in_channel(&self, thread: &Thread) -> bool {
        thread
            .parent_id
            .as_ref()
            .map_or(true, |parent| parent == self.channel)
    }
}

/// Lazily fetched active-thread listing, kept current with this pass's own
/// creates and renames.
#[derive(Default)]
struct ActiveThreads {
    threads: Option<Vec<Thread>>,
}

impl ActiveThreads {
    fn list(
        &mut self,
        gateway: &dyn ThreadGateway,
        channel: &ChannelId,
    ) -> Result<&[Thread], GatewayError> {
        let threads = match self.threads.take() {
            Some(threads) => threads,
            None => gateway.fetch_active_threads(channel)?,
        };
        Ok(self.threads.insert(threads).as_slice())
    }

    fn push(&mut self, thread: Thread) {
        if let Some(threads) = self.threads.as_mut() {
            threads.push(thread);
        }
    }

    fn renamed(&mut self, id: &ThreadId, name: &str) {
        if let Some(thread) = self
            .threads
            .as_mut()
            .and_then(|threads| threads.iter_mut().find(|t| &t.id == id))
        {
            thread.name = name.to_string();
        }
    }
}

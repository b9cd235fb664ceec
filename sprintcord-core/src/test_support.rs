//! In-memory gateways for tests.
//!
//! Both fakes record every call so tests can assert on exactly which remote
//! mutations a pass issued.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::GatewayError;
use crate::gateway::{ThreadGateway, TrackerGateway};
use crate::types::{BoardId, ChannelId, SprintId, Thread, ThreadId, UserId, WorkItem};

type Hook = Arc<dyn Fn() + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

#[derive(Default)]
struct TrackerState {
    sprint: Option<SprintId>,
    items: Vec<WorkItem>,
    sprint_error: Option<GatewayError>,
    issues_error: Option<GatewayError>,
    issues_hook: Option<Hook>,
}

/// Tracker fake holding one board's active sprint.
#[derive(Default)]
pub struct InMemoryTracker {
    state: Mutex<TrackerState>,
}

impl InMemoryTracker {
    /// A tracker whose active sprint `1` contains `items`.
    pub fn with_items(items: Vec<WorkItem>) -> Self {
        let tracker = Self::default();
        tracker.set_sprint(Some(SprintId(1)));
        tracker.set_items(items);
        tracker
    }

    pub fn set_sprint(&self, sprint: Option<SprintId>) {
        lock(&self.state).sprint = sprint;
    }

    pub fn set_items(&self, items: Vec<WorkItem>) {
        lock(&self.state).items = items;
    }

    pub fn fail_sprint_lookup(&self, error: Option<GatewayError>) {
        lock(&self.state).sprint_error = error;
    }

    pub fn fail_issue_fetch(&self, error: Option<GatewayError>) {
        lock(&self.state).issues_error = error;
    }

    /// Run `hook` at the start of every `sprint_issues` call, outside the
    /// fake's own lock. Lets tests park a pass mid-flight.
    pub fn on_issue_fetch(&self, hook: impl Fn() + Send + Sync + 'static) {
        lock(&self.state).issues_hook = Some(Arc::new(hook));
    }
}

impl TrackerGateway for InMemoryTracker {
    fn active_sprint_id(&self, _board: &BoardId) -> Result<Option<SprintId>, GatewayError> {
        let state = lock(&self.state);
        if let Some(err) = state.sprint_error.clone() {
            return Err(err);
        }
        Ok(state.sprint)
    }

    fn sprint_issues(&self, sprint: SprintId) -> Result<Vec<WorkItem>, GatewayError> {
        let hook = lock(&self.state).issues_hook.clone();
        if let Some(hook) = hook {
            hook();
        }
        let state = lock(&self.state);
        if let Some(err) = state.issues_error.clone() {
            return Err(err);
        }
        if state.sprint != Some(sprint) {
            return Err(GatewayError::NotFound(format!("sprint {sprint}")));
        }
        Ok(state.items.clone())
    }
}

// ---------------------------------------------------------------------------
// Threads
// ---------------------------------------------------------------------------

/// One recorded thread-platform call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadCall {
    Fetch(ThreadId),
    FetchActive(ChannelId),
    Create { channel: ChannelId, name: String, auto_archive_minutes: u32 },
    Rename { id: ThreadId, name: String },
    Delete(ThreadId),
    AddMember { thread: ThreadId, user: UserId },
}

#[derive(Default)]
struct ThreadsState {
    threads: BTreeMap<ThreadId, Thread>,
    next_id: u64,
    calls: Vec<ThreadCall>,
    fail_creates: bool,
    fail_active_listing: bool,
    fail_members: bool,
    fail_renames: HashSet<ThreadId>,
}

/// Thread platform fake. Ids are allocated from `1000` upwards.
#[derive(Default)]
pub struct InMemoryThreads {
    state: Mutex<ThreadsState>,
}

impl InMemoryThreads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing, active thread and return its id. Not recorded as a call.
    pub fn insert_thread(&self, channel: &ChannelId, name: &str) -> ThreadId {
        let mut state = lock(&self.state);
        let id = next_id(&mut state);
        state.threads.insert(
            id.clone(),
            Thread {
                id: id.clone(),
                name: name.to_string(),
                parent_id: Some(channel.clone()),
                archived: false,
            },
        );
        id
    }

    /// Simulate the thread being deleted outside of sprintcord.
    pub fn remove_externally(&self, id: &ThreadId) {
        lock(&self.state).threads.remove(id);
    }

    pub fn archive(&self, id: &ThreadId) {
        if let Some(thread) = lock(&self.state).threads.get_mut(id) {
            thread.archived = true;
        }
    }

    pub fn fail_creates(&self, fail: bool) {
        lock(&self.state).fail_creates = fail;
    }

    pub fn fail_active_listing(&self, fail: bool) {
        lock(&self.state).fail_active_listing = fail;
    }

    pub fn fail_member_adds(&self, fail: bool) {
        lock(&self.state).fail_members = fail;
    }

    pub fn fail_renames_of(&self, id: &ThreadId) {
        lock(&self.state).fail_renames.insert(id.clone());
    }

    pub fn thread(&self, id: &ThreadId) -> Option<Thread> {
        lock(&self.state).threads.get(id).cloned()
    }

    pub fn threads(&self) -> Vec<Thread> {
        lock(&self.state).threads.values().cloned().collect()
    }

    pub fn calls(&self) -> Vec<ThreadCall> {
        lock(&self.state).calls.clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.state).calls.clear();
    }

    /// Number of create + rename + delete calls recorded.
    pub fn mutation_count(&self) -> usize {
        lock(&self.state)
            .calls
            .iter()
            .filter(|call| {
                matches!(
                    call,
                    ThreadCall::Create { .. } | ThreadCall::Rename { .. } | ThreadCall::Delete(_)
                )
            })
            .count()
    }
}

fn next_id(state: &mut ThreadsState) -> ThreadId {
    let id = ThreadId(format!("{}", 1000 + state.next_id));
    state.next_id += 1;
    id
}

impl ThreadGateway for InMemoryThreads {
    fn fetch_thread(&self, id: &ThreadId) -> Result<Thread, GatewayError> {
        let mut state = lock(&self.state);
        state.calls.push(ThreadCall::Fetch(id.clone()));
        state
            .threads
            .get(id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("thread {id}")))
    }

    fn fetch_active_threads(&self, channel: &ChannelId) -> Result<Vec<Thread>, GatewayError> {
        let mut state = lock(&self.state);
        state.calls.push(ThreadCall::FetchActive(channel.clone()));
        if state.fail_active_listing {
            return Err(GatewayError::Transport {
                service: "fake",
                url: "threads/active".to_string(),
                message: "listing failed".to_string(),
            });
        }
        Ok(state
            .threads
            .values()
            .filter(|t| !t.archived && t.parent_id.as_ref() == Some(channel))
            .cloned()
            .collect())
    }

    fn create_thread(
        &self,
        channel: &ChannelId,
        name: &str,
        auto_archive_minutes: u32,
    ) -> Result<Thread, GatewayError> {
        let mut state = lock(&self.state);
        state.calls.push(ThreadCall::Create {
            channel: channel.clone(),
            name: name.to_string(),
            auto_archive_minutes,
        });
        if state.fail_creates {
            return Err(GatewayError::Status {
                service: "fake",
                url: "threads".to_string(),
                status: 500,
                body: "create failed".to_string(),
            });
        }
        let id = next_id(&mut state);
        let thread = Thread {
            id: id.clone(),
            name: name.to_string(),
            parent_id: Some(channel.clone()),
            archived: false,
        };
        state.threads.insert(id, thread.clone());
        Ok(thread)
    }

    fn rename_thread(&self, thread: &Thread, name: &str) -> Result<(), GatewayError> {
        let mut state = lock(&self.state);
        state.calls.push(ThreadCall::Rename {
            id: thread.id.clone(),
            name: name.to_string(),
        });
        if state.fail_renames.contains(&thread.id) {
            return Err(GatewayError::Status {
                service: "fake",
                url: format!("channels/{}", thread.id),
                status: 429,
                body: "rate limited".to_string(),
            });
        }
        match state.threads.get_mut(&thread.id) {
            Some(existing) => {
                existing.name = name.to_string();
                existing.archived = false;
                Ok(())
            }
            None => Err(GatewayError::NotFound(format!("thread {}", thread.id))),
        }
    }

    fn delete_thread(&self, id: &ThreadId) -> Result<(), GatewayError> {
        let mut state = lock(&self.state);
        state.calls.push(ThreadCall::Delete(id.clone()));
        match state.threads.remove(id) {
            Some(_) => Ok(()),
            None => Err(GatewayError::NotFound(format!("thread {id}"))),
        }
    }

    fn add_member(&self, thread: &ThreadId, user: &UserId) -> Result<(), GatewayError> {
        let mut state = lock(&self.state);
        state.calls.push(ThreadCall::AddMember {
            thread: thread.clone(),
            user: user.clone(),
        });
        if state.fail_members {
            return Err(GatewayError::Status {
                service: "fake",
                url: format!("channels/{thread}/thread-members/{user}"),
                status: 403,
                body: "missing access".to_string(),
            });
        }
        Ok(())
    }
}

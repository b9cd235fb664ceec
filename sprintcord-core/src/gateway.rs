//! Seams to the two remote systems.
//!
//! Both traits are blocking: implementations carry their own per-request
//! timeout and the daemon runs passes on the blocking pool.

use crate::error::GatewayError;
use crate::types::{BoardId, ChannelId, SprintId, Thread, ThreadId, UserId, WorkItem};

/// Read-only view of the issue tracker.
pub trait TrackerGateway: Send + Sync {
    /// The board's currently active sprint, or `None` between sprints.
    fn active_sprint_id(&self, board: &BoardId) -> Result<Option<SprintId>, GatewayError>;

    /// Every issue in `sprint`.
    fn sprint_issues(&self, sprint: SprintId) -> Result<Vec<WorkItem>, GatewayError>;
}

/// Thread operations on the messaging platform.
pub trait ThreadGateway: Send + Sync {
    fn fetch_thread(&self, id: &ThreadId) -> Result<Thread, GatewayError>;

    /// Active (non-archived) threads whose parent is `channel`.
    fn fetch_active_threads(&self, channel: &ChannelId) -> Result<Vec<Thread>, GatewayError>;

    fn create_thread(
        &self,
        channel: &ChannelId,
        name: &str,
        auto_archive_minutes: u32,
    ) -> Result<Thread, GatewayError>;

    fn rename_thread(&self, thread: &Thread, name: &str) -> Result<(), GatewayError>;

    fn delete_thread(&self, id: &ThreadId) -> Result<(), GatewayError>;

    fn add_member(&self, thread: &ThreadId, user: &UserId) -> Result<(), GatewayError>;
}

//! Domain types shared by the tracker, the thread platform and the sync engine.
//!
//! Identifiers are opaque strings on both sides (Jira issue keys, Discord
//! snowflakes), wrapped in newtypes so they cannot be mixed up.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::status::StatusMarker;

/// Discord rejects thread names longer than this many characters.
pub const MAX_THREAD_NAME_CHARS: usize = 100;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_id!(
    /// Tracker-side work item key, e.g. `PROJ-123`.
    IssueKey
);
string_id!(
    /// Platform-side thread handle (a Discord channel snowflake).
    ThreadId
);
string_id!(
    /// Parent channel that threads are created in.
    ChannelId
);
string_id!(
    /// Tracker board identifier.
    BoardId
);
string_id!(
    /// Platform user to add to newly created threads.
    UserId
);

/// Tracker sprint identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SprintId(pub u64);

impl fmt::Display for SprintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// One issue of the active sprint, as fetched from the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub key: IssueKey,
    pub summary: String,
    pub status: String,
}

impl WorkItem {
    pub fn new(key: impl Into<String>, summary: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            key: IssueKey(key.into()),
            summary: summary.into(),
            status: status.into(),
        }
    }

    /// The thread name this item should currently carry.
    pub fn desired_thread_name(&self) -> String {
        desired_thread_name(StatusMarker::classify(&self.status), &self.key, &self.summary)
    }
}

/// A thread as seen on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: ThreadId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ChannelId>,
    #[serde(default)]
    pub archived: bool,
}

/// `<marker> <key>: <summary>`, capped at [`MAX_THREAD_NAME_CHARS`].
///
/// The summary is trimmed because the platform strips surrounding whitespace
/// from names; an untrimmed name would never compare equal and would be
/// renamed on every pass.
pub fn desired_thread_name(marker: StatusMarker, key: &IssueKey, summary: &str) -> String {
    let name = format!("{} {}: {}", marker.emoji(), key, summary.trim());
    let name = name.trim_end();
    if name.chars().count() <= MAX_THREAD_NAME_CHARS {
        return name.to_string();
    }
    name.chars()
        .take(MAX_THREAD_NAME_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// True when `name` mentions `key` as a whole token.
///
/// `X-1` matches `🟢 X-1: Fix bug` but not `🟢 X-12: Other`, so that keys
/// sharing a prefix do not steal each other's threads.
pub fn name_mentions_key(name: &str, key: &IssueKey) -> bool {
    let key = key.as_str();
    if key.is_empty() {
        return false;
    }
    name.match_indices(key).any(|(start, _)| {
        let before = name[..start].chars().next_back();
        let after = name[start + key.len()..].chars().next();
        !before.is_some_and(is_key_char) && !after.is_some_and(is_key_char)
    })
}

/// True when `name` has the `<marker> <key>:` shape this crate writes.
pub fn name_leads_with_key(name: &str, key: &IssueKey) -> bool {
    name.split_once(' ')
        .and_then(|(_, rest)| rest.strip_prefix(key.as_str()))
        .is_some_and(|rest| rest.starts_with(':'))
}

fn is_key_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newtype_display() {
        assert_eq!(IssueKey::from("X-1").to_string(), "X-1");
        assert_eq!(ThreadId::from("42").to_string(), "42");
        assert_eq!(SprintId(7).to_string(), "7");
    }

    #[test]
    fn desired_name_uses_marker_key_and_summary() {
        let item = WorkItem::new("X-1", "Fix bug", "Done");
        assert_eq!(item.desired_thread_name(), "🟢 X-1: Fix bug");
    }

    #[test]
    fn desired_name_trims_summary() {
        let item = WorkItem::new("X-2", "  padded  ", "In Progress");
        assert_eq!(item.desired_thread_name(), "🔵 X-2: padded");
    }

    #[test]
    fn desired_name_is_capped() {
        let item = WorkItem::new("X-3", "a".repeat(300), "Done");
        let name = item.desired_thread_name();
        assert_eq!(name.chars().count(), MAX_THREAD_NAME_CHARS);
        assert!(name.starts_with("🟢 X-3: aaa"));
    }

    #[test]
    fn key_match_respects_token_boundaries() {
        let key = IssueKey::from("X-1");
        assert!(name_mentions_key("🟢 X-1: Fix bug", &key));
        assert!(name_mentions_key("X-1", &key));
        assert!(!name_mentions_key("🟢 X-12: Other", &key));
        assert!(!name_mentions_key("🟢 AX-1: Other", &key));
        assert!(name_mentions_key("see X-12 and X-1: dup", &key));
    }

    #[test]
    fn leading_key_needs_the_marker_shape() {
        let key = IssueKey::from("X-1");
        assert!(name_leads_with_key("🟢 X-1: Fix bug", &key));
        assert!(!name_leads_with_key("🟢 X-2: Follow-up to X-1", &key));
        assert!(!name_leads_with_key("🟢 X-12: Other", &key));
        assert!(!name_leads_with_key("X-1: no marker", &key));
    }

    #[test]
    fn identifiers_serialize_as_plain_strings() {
        let json = serde_json::to_string(&ThreadId::from("123")).expect("serialize");
        assert_eq!(json, "\"123\"");
    }
}

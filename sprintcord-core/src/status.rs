//! Status classifier: free-text tracker status → thread marker.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Display category of a work item, rendered as the leading emoji of its
/// thread name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusMarker {
    Backlog,
    InProgress,
    Blocked,
    Review,
    Done,
    Unknown,
}

/// Ordered rule table. The first rule with a pattern contained in the
/// normalised label wins.
const RULES: &[(&[&str], StatusMarker)] = &[
    (&["to do", "to-do", "todo"], StatusMarker::Backlog),
    (&["in progress"], StatusMarker::InProgress),
    (&["blocked"], StatusMarker::Blocked),
    (&["testing/review", "testing / review"], StatusMarker::Review),
    (&["done"], StatusMarker::Done),
    (&["awaiting approval"], StatusMarker::Review),
];

impl StatusMarker {
    /// Classify a tracker status label. Total: unrecognised labels map to
    /// [`StatusMarker::Unknown`].
    pub fn classify(label: &str) -> Self {
        let normalized = normalize(label);
        if normalized.is_empty() {
            return StatusMarker::Unknown;
        }
        RULES
            .iter()
            .find(|(patterns, _)| patterns.iter().any(|p| normalized.contains(p)))
            .map(|(_, marker)| *marker)
            .unwrap_or(StatusMarker::Unknown)
    }

    pub fn emoji(self) -> &'static str {
        match self {
            StatusMarker::Backlog => "⏸️",
            StatusMarker::InProgress => "🔵",
            StatusMarker::Blocked => "⚠️",
            StatusMarker::Review => "❗",
            StatusMarker::Done => "🟢",
            StatusMarker::Unknown => "❔",
        }
    }
}

impl fmt::Display for StatusMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StatusMarker::Backlog => "backlog",
            StatusMarker::InProgress => "in progress",
            StatusMarker::Blocked => "blocked",
            StatusMarker::Review => "review",
            StatusMarker::Done => "done",
            StatusMarker::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Trim, lowercase and collapse internal whitespace runs to one space.
fn normalize(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

//! Response shapes for the Agile endpoints sprintcord reads.
//!
//! Only the fields the sync needs are modelled; everything else in the
//! payload is ignored.

use serde::{Deserialize, Serialize};

use sprintcord_core::WorkItem;

/// One page of `GET /board/{id}/sprint`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintPage {
    #[serde(default)]
    pub start_at: u64,
    #[serde(default)]
    pub is_last: bool,
    #[serde(default)]
    pub values: Vec<Sprint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Sprint {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: String,
}

impl Sprint {
    pub fn is_active(&self) -> bool {
        self.state.eq_ignore_ascii_case("active")
    }
}

impl SprintPage {
    /// Start offset of the following page, if there is one.
    pub fn next_start(&self) -> Option<u64> {
        if self.is_last || self.values.is_empty() {
            None
        } else {
            Some(self.start_at + self.values.len() as u64)
        }
    }
}

/// One page of `GET /sprint/{id}/issue`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuePage {
    #[serde(default)]
    pub start_at: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub key: String,
    #[serde(default)]
    pub fields: IssueFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueFields {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub status: Option<IssueStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueStatus {
    pub name: String,
}

impl IssuePage {
    pub fn next_start(&self) -> Option<u64> {
        let next = self.start_at + self.issues.len() as u64;
        if self.issues.is_empty() || next >= self.total {
            None
        } else {
            Some(next)
        }
    }

    /// Convert to work items. Missing summary or status become empty strings;
    /// an empty status classifies as unknown downstream.
    pub fn into_work_items(self) -> Vec<WorkItem> {
        self.issues
            .into_iter()
            .map(|issue| {
                let summary = issue.fields.summary.unwrap_or_default();
                let status = issue.fields.status.map(|s| s.name).unwrap_or_default();
                WorkItem::new(issue.key, summary, status)
            })
            .collect()
    }
}

/// One page of `GET /board`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardPage {
    #[serde(default)]
    pub start_at: u64,
    #[serde(default)]
    pub is_last: bool,
    #[serde(default)]
    pub values: Vec<Board>,
}

impl BoardPage {
    pub fn next_start(&self) -> Option<u64> {
        if self.is_last || self.values.is_empty() {
            None
        } else {
            Some(self.start_at + self.values.len() as u64)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Board {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

//! Blocking Jira client.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use serde::de::DeserializeOwned;

use sprintcord_core::{BoardId, GatewayError, JiraSettings, SprintId, TrackerGateway, WorkItem};

use crate::models::{Board, BoardPage, IssuePage, SprintPage};

const SERVICE: &str = "jira";
const AGILE_PATH: &str = "rest/agile/1.0";
const PAGE_SIZE: u32 = 50;
const MAX_ERROR_BODY: usize = 512;

/// `Authorization` header value for Jira Cloud basic auth.
pub fn basic_auth_header(email: &str, api_token: &str) -> String {
    format!(
        "Basic {}",
        BASE64_STANDARD.encode(format!("{email}:{api_token}"))
    )
}

pub fn sprints_url(base_url: &str, board: &BoardId, start_at: u64) -> String {
    format!("{base_url}/{AGILE_PATH}/board/{board}/sprint?state=active&startAt={start_at}")
}

pub fn issues_url(base_url: &str, sprint: SprintId, start_at: u64) -> String {
    format!(
        "{base_url}/{AGILE_PATH}/sprint/{sprint}/issue?fields=summary,status&startAt={start_at}&maxResults={PAGE_SIZE}"
    )
}

pub fn boards_url(base_url: &str, start_at: u64) -> String {
    format!("{base_url}/{AGILE_PATH}/board?startAt={start_at}")
}

pub struct JiraClient {
    agent: ureq::Agent,
    base_url: String,
    auth: String,
}

impl JiraClient {
    pub fn new(settings: &JiraSettings, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            auth: basic_auth_header(&settings.email, &settings.api_token),
        }
    }

    /// Every board visible to the configured credentials.
    pub fn list_boards(&self) -> Result<Vec<Board>, GatewayError> {
        let mut boards = Vec::new();
        let mut start_at = 0;
        loop {
            let page: BoardPage = self.get_json(&boards_url(&self.base_url, start_at))?;
            let next = page.next_start();
            boards.extend(page.values);
            match next {
                Some(n) => start_at = n,
                None => break,
            }
        }
        Ok(boards)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, GatewayError> {
        tracing::debug!(url, "jira request");
        let response = self
            .agent
            .get(url)
            .set("Authorization", &self.auth)
            .set("Accept", "application/json")
            .call()
            .map_err(|err| map_ureq_error(url, err))?;
        let body = response
            .into_string()
            .map_err(|err| GatewayError::Transport {
                service: SERVICE,
                url: url.to_string(),
                message: err.to_string(),
            })?;
        serde_json::from_str(&body).map_err(|err| GatewayError::Decode {
            service: SERVICE,
            url: url.to_string(),
            message: err.to_string(),
        })
    }
}

impl TrackerGateway for JiraClient {
    fn active_sprint_id(&self, board: &BoardId) -> Result<Option<SprintId>, GatewayError> {
        let mut start_at = 0;
        loop {
            let page: SprintPage = self.get_json(&sprints_url(&self.base_url, board, start_at))?;
            if let Some(sprint) = page.values.iter().find(|s| s.is_active()) {
                tracing::debug!(board = %board, sprint = sprint.id, name = %sprint.name, "active sprint");
                return Ok(Some(SprintId(sprint.id)));
            }
            match page.next_start() {
                Some(n) => start_at = n,
                None => return Ok(None),
            }
        }
    }

    fn sprint_issues(&self, sprint: SprintId) -> Result<Vec<WorkItem>, GatewayError> {
        let mut items = Vec::new();
        let mut start_at = 0;
        loop {
            let page: IssuePage = self.get_json(&issues_url(&self.base_url, sprint, start_at))?;
            let next = page.next_start();
            items.extend(page.into_work_items());
            match next {
                Some(n) => start_at = n,
                None => break,
            }
        }
        tracing::debug!(sprint = %sprint, count = items.len(), "fetched sprint issues");
        Ok(items)
    }
}

fn map_ureq_error(url: &str, err: ureq::Error) -> GatewayError {
    match err {
        ureq::Error::Status(status, response) => {
            let body: String = response
                .into_string()
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY)
                .collect();
            GatewayError::Status {
                service: SERVICE,
                url: url.to_string(),
                status,
                body,
            }
        }
        ureq::Error::Transport(transport) => GatewayError::Transport {
            service: SERVICE,
            url: url.to_string(),
            message: transport.to_string(),
        },
    }
}

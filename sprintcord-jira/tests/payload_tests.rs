//! Decoding of recorded Agile API payloads and request construction.

use rstest::rstest;

use sprintcord_core::{BoardId, IssueKey, SprintId};
use sprintcord_jira::{
    basic_auth_header, boards_url, issues_url, sprints_url, BoardPage, IssuePage, SprintPage,
};

const SPRINTS: &str = r#"{
  "maxResults": 50,
  "startAt": 0,
  "isLast": true,
  "values": [
    {"id": 37, "self": "https://acme.atlassian.net/rest/agile/1.0/sprint/37",
     "state": "closed", "name": "Sprint 11", "originBoardId": 5},
    {"id": 38, "state": "active", "name": "Sprint 12",
     "startDate": "2026-10-05T09:00:00.000Z", "originBoardId": 5}
  ]
}"#;

const ISSUES_PAGE_1: &str = r#"{
  "expand": "schema,names",
  "startAt": 0,
  "maxResults": 2,
  "total": 3,
  "issues": [
    {"id": "10001", "key": "X-1",
     "fields": {"summary": "Fix bug", "status": {"name": "Done", "id": "10002"}}},
    {"id": "10002", "key": "X-2",
     "fields": {"summary": "Add export", "status": {"name": "In Progress"}}}
  ]
}"#;

const ISSUES_PAGE_2: &str = r#"{
  "startAt": 2,
  "maxResults": 2,
  "total": 3,
  "issues": [
    {"id": "10003", "key": "X-3", "fields": {"summary": null, "status": null}}
  ]
}"#;

#[test]
fn sprint_page_exposes_the_active_sprint() {
    let page: SprintPage = serde_json::from_str(SPRINTS).unwrap();
    let active: Vec<_> = page.values.iter().filter(|s| s.is_active()).collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, 38);
    assert_eq!(page.next_start(), None);
}

#[test]
fn issue_pages_paginate_by_total() {
    let first: IssuePage = serde_json::from_str(ISSUES_PAGE_1).unwrap();
    let second: IssuePage = serde_json::from_str(ISSUES_PAGE_2).unwrap();

    assert_eq!(first.next_start(), Some(2));
    assert_eq!(second.next_start(), None);

    let items = first.into_work_items();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].key, IssueKey::from("X-1"));
    assert_eq!(items[0].summary, "Fix bug");
    assert_eq!(items[0].status, "Done");
    assert_eq!(items[0].desired_thread_name(), "🟢 X-1: Fix bug");
}

#[test]
fn null_fields_become_empty_strings() {
    let page: IssuePage = serde_json::from_str(ISSUES_PAGE_2).unwrap();
    let items = page.into_work_items();
    assert_eq!(items[0].summary, "");
    assert_eq!(items[0].status, "");
}

#[test]
fn empty_issue_page_stops_pagination() {
    let page: IssuePage =
        serde_json::from_str(r#"{"startAt": 0, "total": 10, "issues": []}"#).unwrap();
    assert_eq!(page.next_start(), None);
}

#[test]
fn board_page_decodes_type_field() {
    let page: BoardPage = serde_json::from_str(
        r#"{"startAt": 0, "isLast": false, "values": [
            {"id": 5, "name": "Platform", "type": "scrum"},
            {"id": 9, "name": "Support", "type": "kanban"}
        ]}"#,
    )
    .unwrap();
    assert_eq!(page.values[0].kind, "scrum");
    assert_eq!(page.next_start(), Some(2));
}

#[test]
fn auth_header_is_base64_of_email_and_token() {
    // "ann@acme.io:s3cret"
    assert_eq!(
        basic_auth_header("ann@acme.io", "s3cret"),
        "Basic YW5uQGFjbWUuaW86czNjcmV0"
    );
}

#[rstest]
#[case(
    sprints_url("https://acme.atlassian.net", &BoardId::from("5"), 0),
    "https://acme.atlassian.net/rest/agile/1.0/board/5/sprint?state=active&startAt=0"
)]
#[case(
    issues_url("https://acme.atlassian.net", SprintId(38), 50),
    "https://acme.atlassian.net/rest/agile/1.0/sprint/38/issue?fields=summary,status&startAt=50&maxResults=50"
)]
#[case(
    boards_url("https://acme.atlassian.net", 0),
    "https://acme.atlassian.net/rest/agile/1.0/board?startAt=0"
)]
fn request_urls(#[case] actual: String, #[case] expected: &str) {
    assert_eq!(actual, expected);
}

//! Status classifier table tests.

use rstest::rstest;
use sprintcord_core::{IssueKey, StatusMarker, WorkItem};

// ---------------------------------------------------------------------------
// 1. Known labels, including case and whitespace variants
// ---------------------------------------------------------------------------

#[rstest]
#[case("To Do", StatusMarker::Backlog)]
#[case("to do", StatusMarker::Backlog)]
#[case("  TO   DO ", StatusMarker::Backlog)]
#[case("To-Do", StatusMarker::Backlog)]
#[case("In Progress", StatusMarker::InProgress)]
#[case(" In Progress ", StatusMarker::InProgress)]
#[case("IN\tPROGRESS", StatusMarker::InProgress)]
#[case("Blocked", StatusMarker::Blocked)]
#[case("blocked ", StatusMarker::Blocked)]
#[case("Testing/Review", StatusMarker::Review)]
#[case("Testing / Review", StatusMarker::Review)]
#[case("testing   /  review", StatusMarker::Review)]
#[case("Done", StatusMarker::Done)]
#[case("DONE", StatusMarker::Done)]
#[case("Awaiting Approval", StatusMarker::Review)]
#[case(" awaiting  approval", StatusMarker::Review)]
fn known_labels(#[case] label: &str, #[case] expected: StatusMarker) {
    assert_eq!(StatusMarker::classify(label), expected, "label {label:?}");
}

// ---------------------------------------------------------------------------
// 2. Substring matches
// ---------------------------------------------------------------------------

#[rstest]
#[case("Dev In Progress", StatusMarker::InProgress)]
#[case("Blocked by vendor", StatusMarker::Blocked)]
#[case("Done (verified)", StatusMarker::Done)]
fn substring_labels(#[case] label: &str, #[case] expected: StatusMarker) {
    assert_eq!(StatusMarker::classify(label), expected);
}

// ---------------------------------------------------------------------------
// 3. Unknown is the total fallback
// ---------------------------------------------------------------------------

#[rstest]
#[case("WAT")]
#[case("")]
#[case("   ")]
#[case("Selected for Development")]
#[case("🚀")]
fn unrecognised_labels_are_unknown(#[case] label: &str) {
    assert_eq!(StatusMarker::classify(label), StatusMarker::Unknown);
}

#[test]
fn every_marker_has_a_distinct_emoji() {
    let markers = [
        StatusMarker::Backlog,
        StatusMarker::InProgress,
        StatusMarker::Blocked,
        StatusMarker::Review,
        StatusMarker::Done,
        StatusMarker::Unknown,
    ];
    let mut emojis: Vec<_> = markers.iter().map(|m| m.emoji()).collect();
    emojis.sort();
    emojis.dedup();
    assert_eq!(emojis.len(), markers.len());
}

#[test]
fn unknown_status_still_yields_a_thread_name() {
    let item = WorkItem::new("OPS-9", "Rotate keys", "Icebox");
    assert_eq!(item.desired_thread_name(), "❔ OPS-9: Rotate keys");
    assert_eq!(item.key, IssueKey::from("OPS-9"));
}

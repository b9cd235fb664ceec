use rstest::rstest;
use serde_json::{json, Value};

use sprintcord_core::{ChannelId, GatewayError, Thread, ThreadId};
use sprintcord_discord::{
    create_thread_body, message_thread_path, messages_path, rename_thread_body,
    starter_message_body, ActiveThreads, Channel, CurrentUser, Message,
};

const ACTIVE: &str = r#"{
  "threads": [
    {"id": "1101", "type": 11, "guild_id": "77", "parent_id": "500",
     "name": "🟢 X-1: Fix bug", "owner_id": "9",
     "thread_metadata": {"archived": false, "auto_archive_duration": 1440, "locked": false}},
    {"id": "1102", "type": 11, "guild_id": "77", "parent_id": "600",
     "name": "🔵 X-2: Elsewhere",
     "thread_metadata": {"archived": false, "auto_archive_duration": 60}},
    {"id": "1103", "type": 12, "guild_id": "77", "parent_id": "500",
     "name": "private chat", "thread_metadata": {"archived": false}}
  ],
  "members": []
}"#;

#[test]
fn active_threads_are_filtered_by_parent() {
    let active: ActiveThreads = serde_json::from_str(ACTIVE).unwrap();
    let threads = active.in_parent(&ChannelId::from("500"));

    let ids: Vec<_> = threads.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["1101", "1103"]);
    assert_eq!(threads[0].name, "🟢 X-1: Fix bug");
    assert_eq!(threads[0].parent_id, Some(ChannelId::from("500")));
    assert!(!threads[0].archived);
}

#[test]
fn archived_flag_comes_from_thread_metadata() {
    let channel: Channel = serde_json::from_value(json!({
        "id": "1200", "type": 11, "parent_id": "500", "name": "⏸️ X-3: Later",
        "thread_metadata": {"archived": true}
    }))
    .unwrap();
    let thread = channel.into_thread().unwrap();
    assert!(thread.archived);
}

#[test]
fn non_thread_channel_is_not_a_thread() {
    let channel: Channel =
        serde_json::from_value(json!({"id": "500", "type": 0, "guild_id": "77", "name": "sprint"}))
            .unwrap();
    let err = channel.into_thread().unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn text_channel_yields_its_guild() {
    let channel: Channel =
        serde_json::from_value(json!({"id": "500", "type": 0, "guild_id": "77"})).unwrap();
    assert_eq!(channel.text_channel_guild().unwrap(), "77");
}

#[test]
fn voice_channel_is_rejected_at_login() {
    let channel: Channel =
        serde_json::from_value(json!({"id": "501", "type": 2, "guild_id": "77"})).unwrap();
    assert!(matches!(
        channel.text_channel_guild(),
        Err(GatewayError::Rejected(_))
    ));
}

#[test]
fn current_user_decodes() {
    let user: CurrentUser = serde_json::from_str(
        r#"{"id": "9", "username": "sprintcord", "bot": true, "discriminator": "0"}"#,
    )
    .unwrap();
    assert_eq!(user.username, "sprintcord");
    assert!(user.bot);
}

#[test]
fn starter_message_decodes_to_its_id() {
    let message: Message = serde_json::from_str(
        r#"{"id": "8800", "channel_id": "500", "content": "Creating thread for **🟢 X-1: Fix bug**", "type": 0}"#,
    )
    .unwrap();
    assert_eq!(message.id, "8800");
}

#[rstest]
#[case::messages(messages_path(&ChannelId::from("500")), "/channels/500/messages")]
#[case::thread_from_message(
    message_thread_path(&ChannelId::from("500"), "8800"),
    "/channels/500/messages/8800/threads"
)]
fn thread_creation_paths(#[case] path: String, #[case] expected: &str) {
    assert_eq!(path, expected);
}

fn thread(archived: bool) -> Thread {
    Thread {
        id: ThreadId::from("1101"),
        name: "🔵 X-1: Fix bug".to_string(),
        parent_id: Some(ChannelId::from("500")),
        archived,
    }
}

#[rstest]
#[case::starter(
    starter_message_body("🟢 X-1: Fix bug"),
    json!({"content": "Creating thread for **🟢 X-1: Fix bug**"})
)]
#[case::create(
    create_thread_body("🟢 X-1: Fix bug", 1440),
    json!({"name": "🟢 X-1: Fix bug", "auto_archive_duration": 1440})
)]
#[case::rename_open(
    rename_thread_body(&thread(false), "🟢 X-1: Fix bug"),
    json!({"name": "🟢 X-1: Fix bug"})
)]
#[case::rename_unarchives(
    rename_thread_body(&thread(true), "🟢 X-1: Fix bug"),
    json!({"name": "🟢 X-1: Fix bug", "archived": false})
)]
fn request_bodies(#[case] body: Value, #[case] expected: Value) {
    assert_eq!(body, expected);
}

//! Unit tests for command parsing and argument access.

use meeting_bridge::models::command::{Command, CommandKind};

#[test]
fn every_canonical_name_parses() {
    let names = [
        ("init", CommandKind::Init),
        ("login", CommandKind::Login),
        ("join", CommandKind::Join),
        ("start_normal", CommandKind::StartNormal),
        ("init_and_join", CommandKind::InitAndJoin),
        ("meeting_status", CommandKind::MeetingStatus),
        ("meeting_details", CommandKind::MeetingDetails),
        ("logout", CommandKind::Logout),
        ("leave_meeting", CommandKind::LeaveMeeting),
        ("show_meeting", CommandKind::ShowMeeting),
        ("hide_meeting", CommandKind::HideMeeting),
        ("get_mic_status", CommandKind::GetMicStatus),
        ("mute_my_audio", CommandKind::MuteMyAudio),
    ];
    for (name, kind) in names {
        assert_eq!(CommandKind::parse(name), Some(kind), "{name}");
        assert_eq!(kind.as_str(), name);
    }
}

#[test]
fn camel_case_aliases_parse() {
    assert_eq!(CommandKind::parse("startNormal"), Some(CommandKind::StartNormal));
    assert_eq!(
        CommandKind::parse("getMicStatus"),
        Some(CommandKind::GetMicStatus)
    );
    assert_eq!(
        CommandKind::parse("muteMyAudio"),
        Some(CommandKind::MuteMyAudio)
    );
}

#[test]
fn unknown_name_has_no_kind() {
    assert_eq!(Command::new("frobnicate").kind(), None);
}

#[test]
fn only_lifecycle_commands_are_session_mutating() {
    let mutating = [
        CommandKind::Init,
        CommandKind::Login,
        CommandKind::Join,
        CommandKind::StartNormal,
        CommandKind::InitAndJoin,
    ];
    for kind in mutating {
        assert!(kind.is_session_mutating(), "{kind}");
    }
    assert!(!CommandKind::MeetingStatus.is_session_mutating());
    assert!(!CommandKind::LeaveMeeting.is_session_mutating());
    assert!(!CommandKind::MuteMyAudio.is_session_mutating());
}

#[test]
fn empty_argument_counts_as_absent() {
    let command = Command::new("join")
        .with_arg("meetingId", "")
        .with_arg("displayName", "Ada");
    assert_eq!(command.arg("meetingId"), None);
    assert_eq!(command.arg("displayName"), Some("Ada"));
    assert_eq!(command.arg("missing"), None);
}

#[test]
fn deserializes_from_method_envelope() {
    let command: Command = serde_json::from_str(
        r#"{"method": "join", "arguments": {"meetingId": "123"}}"#,
    )
    .expect("parse");
    assert_eq!(command.kind(), Some(CommandKind::Join));
    assert_eq!(command.arg("meetingId"), Some("123"));
}

#[test]
fn arguments_default_to_empty() {
    let command: Command = serde_json::from_str(r#"{"name": "logout"}"#).expect("parse");
    assert!(command.arguments.is_empty());
}

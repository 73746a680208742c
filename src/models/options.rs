//! Meeting options coerced from loosely-typed command arguments.

use std::collections::HashMap;

use crate::models::command::Command;

/// Hide the meeting number in the meeting view.
pub const NO_TEXT_MEETING_ID: u32 = 64;
/// Hide the meeting password in the meeting view.
pub const NO_TEXT_PASSWORD: u32 = 128;

/// Options shared by the join and start families of commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeetingOptions {
    /// Hide the invite button.
    pub disable_invite: bool,
    /// Hide the share button.
    pub disable_share: bool,
    /// Hide the title bar.
    pub disable_titlebar: bool,
    /// Disable driving mode.
    pub disable_drive: bool,
    /// Disable dial-in via phone.
    pub disable_dial_in: bool,
    /// Keep audio connected when the meeting UI is backgrounded.
    pub no_disconnect_audio: bool,
    /// Join without audio.
    pub no_audio: bool,
    /// Join with video off.
    pub no_video: bool,
    /// Hide meeting number and password in the meeting view.
    pub view_options: bool,
    /// Display name shown to other participants.
    pub display_name: Option<String>,
    /// Meeting number.
    pub meeting_id: Option<String>,
    /// Meeting password.
    pub meeting_password: Option<String>,
}

/// Coerce an argument to a flag: present and equal to `"true"`
/// (case-insensitive) is `true`, anything else is `false`.
#[must_use]
pub fn parse_flag(arguments: &HashMap<String, String>, key: &str) -> bool {
    arguments
        .get(key)
        .is_some_and(|value| value.eq_ignore_ascii_case("true"))
}

impl MeetingOptions {
    /// Build options from a command's arguments.
    #[must_use]
    pub fn from_command(command: &Command) -> Self {
        let args = &command.arguments;
        Self {
            disable_invite: parse_flag(args, "disableInvite"),
            disable_share: parse_flag(args, "disableShare"),
            disable_titlebar: parse_flag(args, "disableTitlebar"),
            disable_drive: parse_flag(args, "disableDrive"),
            disable_dial_in: parse_flag(args, "disableDialIn"),
            no_disconnect_audio: parse_flag(args, "noDisconnectAudio"),
            no_audio: parse_flag(args, "noAudio"),
            no_video: parse_flag(args, "noVideo"),
            view_options: parse_flag(args, "viewOptions"),
            display_name: command.arg("displayName").map(str::to_owned),
            meeting_id: command.arg("meetingId").map(str::to_owned),
            meeting_password: command.arg("meetingPassword").map(str::to_owned),
        }
    }

    /// Bitmask of meeting-view elements to hide.
    #[must_use]
    pub fn meeting_views_options(&self) -> u32 {
        if self.view_options {
            NO_TEXT_MEETING_ID | NO_TEXT_PASSWORD
        } else {
            0
        }
    }
}

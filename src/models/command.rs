//! Commands received on the command channel.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use serde::Deserialize;

/// A named command with loosely-typed string arguments.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Command {
    /// Operation name, e.g. `start_normal`.
    #[serde(alias = "method")]
    pub name: String,
    /// Operation arguments.
    #[serde(default)]
    pub arguments: HashMap<String, String>,
}

impl Command {
    /// Command with no arguments.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: HashMap::new(),
        }
    }

    /// Builder-style argument setter.
    #[must_use]
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// Argument value, treating empty strings as absent.
    #[must_use]
    pub fn arg(&self, key: &str) -> Option<&str> {
        self.arguments
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Recognized operation for this command, if any.
    #[must_use]
    pub fn kind(&self) -> Option<CommandKind> {
        CommandKind::parse(&self.name)
    }
}

/// Operations the dispatcher recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Initialize the SDK.
    Init,
    /// Log in (if needed) and start an instant meeting.
    Login,
    /// Join a meeting by number.
    Join,
    /// Log in (if needed) and start a meeting by number.
    StartNormal,
    /// Initialize, authenticate and join in one chain.
    InitAndJoin,
    /// Report the current meeting status.
    MeetingStatus,
    /// Report meeting number and password.
    MeetingDetails,
    /// Log out of the SDK.
    Logout,
    /// Leave the current meeting.
    LeaveMeeting,
    /// Bring the meeting UI to the front.
    ShowMeeting,
    /// Minimize the meeting UI.
    HideMeeting,
    /// Report whether the local microphone is muted.
    GetMicStatus,
    /// Mute or unmute the local microphone.
    MuteMyAudio,
}

impl CommandKind {
    /// Resolve a command name, accepting the camel-case aliases used by
    /// older clients.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let kind = match name {
            "init" => Self::Init,
            "login" => Self::Login,
            "join" => Self::Join,
            "start_normal" | "startNormal" => Self::StartNormal,
            "init_and_join" => Self::InitAndJoin,
            "meeting_status" => Self::MeetingStatus,
            "meeting_details" => Self::MeetingDetails,
            "logout" => Self::Logout,
            "leave_meeting" => Self::LeaveMeeting,
            "show_meeting" => Self::ShowMeeting,
            "hide_meeting" => Self::HideMeeting,
            "get_mic_status" | "getMicStatus" => Self::GetMicStatus,
            "mute_my_audio" | "muteMyAudio" => Self::MuteMyAudio,
            _ => return None,
        };
        Some(kind)
    }

    /// Canonical wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Login => "login",
            Self::Join => "join",
            Self::StartNormal => "start_normal",
            Self::InitAndJoin => "init_and_join",
            Self::MeetingStatus => "meeting_status",
            Self::MeetingDetails => "meeting_details",
            Self::Logout => "logout",
            Self::LeaveMeeting => "leave_meeting",
            Self::ShowMeeting => "show_meeting",
            Self::HideMeeting => "hide_meeting",
            Self::GetMicStatus => "get_mic_status",
            Self::MuteMyAudio => "mute_my_audio",
        }
    }

    /// Whether the command mutates the session and therefore must not run
    /// while another result is parked.
    #[must_use]
    pub fn is_session_mutating(self) -> bool {
        matches!(
            self,
            Self::Init | Self::Login | Self::Join | Self::StartNormal | Self::InitAndJoin
        )
    }
}

impl Display for CommandKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Meeting and audio status values reported by the SDK, and the events the
//! relay forwards to subscribers.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize, Serializer};

use crate::models::session::SessionPhase;

/// Meeting lifecycle status as reported by the SDK's meeting service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeetingStatus {
    /// No meeting.
    Idle,
    /// Connecting to the meeting server.
    Connecting,
    /// Waiting for the host to start the meeting.
    WaitingForHost,
    /// Inside the meeting.
    InMeeting,
    /// Leaving the meeting.
    Disconnecting,
    /// Connection dropped; rejoining.
    Reconnecting,
    /// Meeting failed to start or join.
    Failed,
    /// Held in the waiting room.
    InWaitingRoom,
    /// Promoted from webinar attendee to panelist.
    WebinarPromote,
    /// Demoted from panelist to webinar attendee.
    WebinarDepromote,
    /// Meeting ended by the host.
    Ended,
    /// Status the SDK could not classify.
    Unknown,
}

impl MeetingStatus {
    /// Every status, in SDK ordinal order.
    pub const ALL: [Self; 12] = [
        Self::Idle,
        Self::Connecting,
        Self::WaitingForHost,
        Self::InMeeting,
        Self::Disconnecting,
        Self::Reconnecting,
        Self::Failed,
        Self::InWaitingRoom,
        Self::WebinarPromote,
        Self::WebinarDepromote,
        Self::Ended,
        Self::Unknown,
    ];

    /// Wire name emitted to subscribers and returned by `meeting_status`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "MEETING_STATUS_IDLE",
            Self::Connecting => "MEETING_STATUS_CONNECTING",
            Self::WaitingForHost => "MEETING_STATUS_WAITINGFORHOST",
            Self::InMeeting => "MEETING_STATUS_INMEETING",
            Self::Disconnecting => "MEETING_STATUS_DISCONNECTING",
            Self::Reconnecting => "MEETING_STATUS_RECONNECTING",
            Self::Failed => "MEETING_STATUS_FAILED",
            Self::InWaitingRoom => "MEETING_STATUS_IN_WAITING_ROOM",
            Self::WebinarPromote => "MEETING_STATUS_WEBINAR_PROMOTE",
            Self::WebinarDepromote => "MEETING_STATUS_WEBINAR_DEPROMOTE",
            Self::Ended => "MEETING_STATUS_ENDED",
            Self::Unknown => "MEETING_STATUS_UNKNOWN",
        }
    }

    /// Parse a wire name back into a status.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == name)
    }

    /// Session phase this status implies, or `None` when it carries no
    /// lifecycle information.
    #[must_use]
    pub fn phase(self) -> Option<SessionPhase> {
        match self {
            Self::Connecting | Self::WaitingForHost | Self::Reconnecting | Self::InWaitingRoom => {
                Some(SessionPhase::Starting)
            }
            Self::InMeeting | Self::WebinarPromote | Self::WebinarDepromote => {
                Some(SessionPhase::Active)
            }
            Self::Disconnecting => Some(SessionPhase::Leaving),
            Self::Idle | Self::Failed | Self::Ended => Some(SessionPhase::Idle),
            Self::Unknown => None,
        }
    }
}

impl Display for MeetingStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Serialized as the wire name, matching what subscribers receive.
impl Serialize for MeetingStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Audio state of one participant.
///
/// Forwarded to device-topic subscribers as its ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioStatus {
    /// No audio status.
    None,
    /// Muted by the participant.
    Muted,
    /// Unmuted by the participant.
    UnMuted,
    /// Muted by the host.
    MutedByHost,
    /// Unmuted by the host.
    UnMutedByHost,
    /// Host muted everyone.
    MutedAllByHost,
    /// Host unmuted everyone.
    UnMutedAllByHost,
}

impl AudioStatus {
    /// Ordinal position, stable across releases.
    #[must_use]
    pub fn ordinal(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Muted => 1,
            Self::UnMuted => 2,
            Self::MutedByHost => 3,
            Self::UnMutedByHost => 4,
            Self::MutedAllByHost => 5,
            Self::UnMutedAllByHost => 6,
        }
    }
}

/// Independent broadcast categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// Session-status changes, emitted as status names.
    MeetingStatus,
    /// Local participant audio changes, emitted as ordinals.
    DeviceAudio,
}

impl Topic {
    /// Wire name of the topic.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MeetingStatus => "meeting_status",
            Self::DeviceAudio => "device_audio",
        }
    }
}

impl Display for Topic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload carried by a [`StatusEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EventPayload {
    /// Status name, e.g. `MEETING_STATUS_INMEETING`.
    Status(String),
    /// Enum ordinal, e.g. an [`AudioStatus`] position.
    Ordinal(u32),
}

/// One event delivered to a topic subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEvent {
    /// Topic the event belongs to.
    pub topic: Topic,
    /// Event payload.
    pub payload: EventPayload,
}

impl StatusEvent {
    /// Session-status event carrying the status name.
    #[must_use]
    pub fn meeting_status(status: MeetingStatus) -> Self {
        Self {
            topic: Topic::MeetingStatus,
            payload: EventPayload::Status(status.as_str().to_owned()),
        }
    }

    /// Device-audio event carrying the status ordinal.
    #[must_use]
    pub fn device_audio(status: AudioStatus) -> Self {
        Self {
            topic: Topic::DeviceAudio,
            payload: EventPayload::Ordinal(status.ordinal()),
        }
    }
}

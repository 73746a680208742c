//! Capability interface over the native meeting SDK.
//!
//! The [`MeetingSdk`] trait is the only way the bridge talks to the SDK.
//! Every call returns immediately; results that the SDK reports later
//! arrive as typed [`Callback`]s through a
//! [`CallbackSink`](crate::bridge::CallbackSink), and topic events arrive
//! through registered [`NativeListener`]s. Tests and the development
//! binary use [`simulated::SimulatedSdk`].

pub mod simulated;

use std::fmt;
use std::sync::Arc;

use crate::models::options::MeetingOptions;
use crate::models::status::{AudioStatus, MeetingStatus, Topic};
use crate::Result;

/// Result code the SDK uses for success.
pub const SDK_SUCCESS: i64 = 0;

/// Parameters for SDK initialization.
#[derive(Clone, PartialEq, Eq)]
pub struct InitParams {
    /// Application key.
    pub app_key: Option<String>,
    /// Application secret.
    pub app_secret: Option<String>,
    /// Pre-signed SDK token, used instead of key and secret.
    pub jwt_token: Option<String>,
    /// Web domain of the meeting service.
    pub domain: String,
    /// Whether the SDK writes its own log files.
    pub enable_log: bool,
}

impl InitParams {
    /// Whether the parameters carry usable credentials.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.jwt_token.is_some() || (self.app_key.is_some() && self.app_secret.is_some())
    }
}

// Secrets never reach the logs.
impl fmt::Debug for InitParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitParams")
            .field("app_key", &self.app_key.as_ref().map(|_| "<redacted>"))
            .field("app_secret", &self.app_secret.as_ref().map(|_| "<redacted>"))
            .field("jwt_token", &self.jwt_token.as_ref().map(|_| "<redacted>"))
            .field("domain", &self.domain)
            .field("enable_log", &self.enable_log)
            .finish()
    }
}

/// User credentials for authentication.
///
/// Both fields are optional: an SDK already holding a cached identity
/// authenticates without them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthRequest {
    /// Account identifier.
    pub user_id: Option<String>,
    /// Account password.
    pub password: Option<String>,
}

/// Result of the OS microphone permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    /// Permission is granted.
    Granted,
    /// Permission is not granted yet.
    Denied,
}

/// Results the SDK and the host platform report asynchronously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    /// SDK initialization finished.
    InitializeResult {
        /// SDK error code; `0` is success.
        error_code: i64,
        /// SDK-internal error code.
        internal_error_code: i64,
    },
    /// Authentication finished; `0` is success.
    AuthenticationResult {
        /// Authentication result code.
        code: i64,
    },
    /// Logout finished.
    LogoutResult {
        /// Logout result code.
        code: i64,
    },
    /// Meeting status changed.
    MeetingStatusChanged {
        /// New status.
        status: MeetingStatus,
        /// Status-specific detail code.
        code: i64,
    },
    /// The OS answered a microphone permission request.
    PermissionResult {
        /// Whether the user granted the permission.
        granted: bool,
    },
}

/// Events the SDK delivers to topic listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeEvent {
    /// Meeting status changed.
    MeetingStatusChanged {
        /// New status.
        status: MeetingStatus,
        /// Status-specific detail code.
        code: i64,
    },
    /// A participant's audio state changed.
    UserAudioStatusChanged {
        /// Participant the change concerns.
        user_id: u64,
        /// New audio state.
        status: AudioStatus,
    },
}

impl NativeEvent {
    /// Topic this event is delivered on.
    #[must_use]
    pub fn topic(&self) -> Topic {
        match self {
            Self::MeetingStatusChanged { .. } => Topic::MeetingStatus,
            Self::UserAudioStatusChanged { .. } => Topic::DeviceAudio,
        }
    }
}

/// Listener object registered with the SDK for one topic.
///
/// The SDK invokes `on_event` on its own callback thread, so
/// implementations must not block.
pub trait NativeListener: Send + Sync {
    /// Handle one native event.
    fn on_event(&self, event: &NativeEvent);
}

/// Narrow view of the native meeting SDK.
pub trait MeetingSdk: Send + Sync {
    /// Begin initialization. The outcome arrives as
    /// [`Callback::InitializeResult`].
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Sdk`](crate::AppError::Sdk) if the request is rejected outright.
    fn initialize(&self, params: &InitParams) -> Result<()>;

    /// Begin authentication. The outcome arrives as
    /// [`Callback::AuthenticationResult`].
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Sdk`](crate::AppError::Sdk) if the request is rejected outright.
    fn authenticate(&self, request: &AuthRequest) -> Result<()>;

    /// Log the current user out.
    fn logout(&self);

    /// Start an instant meeting as the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Sdk`](crate::AppError::Sdk) with the SDK's meeting error code.
    fn start_instant_meeting(&self, options: &MeetingOptions) -> Result<()>;

    /// Start the meeting with the given number as the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Sdk`](crate::AppError::Sdk) with the SDK's meeting error code.
    fn start_meeting(&self, meeting_no: &str, options: &MeetingOptions) -> Result<()>;

    /// Join the meeting named in `options`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Sdk`](crate::AppError::Sdk) with the SDK's meeting error code.
    fn join_meeting(&self, options: &MeetingOptions) -> Result<()>;

    /// Leave the current meeting, if any.
    fn leave_meeting(&self);

    /// Current meeting status, or `None` when the meeting service is unavailable.
    fn meeting_status(&self) -> Option<MeetingStatus>;

    /// Meeting number and password of the current meeting.
    fn meeting_credentials(&self) -> Option<(String, String)>;

    /// Participant id of the local user in the current meeting.
    fn my_user_id(&self) -> Option<u64>;

    /// Whether meeting audio is connected.
    fn is_audio_connected(&self) -> bool;

    /// Connect meeting audio over VoIP.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Sdk`](crate::AppError::Sdk) if the audio controller refuses.
    fn connect_audio(&self) -> Result<()>;

    /// Whether the local microphone is muted.
    fn is_my_audio_muted(&self) -> bool;

    /// Mute or unmute the local microphone.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Sdk`](crate::AppError::Sdk) if the audio controller refuses.
    fn mute_my_audio(&self, mute: bool) -> Result<()>;

    /// Bring the meeting window to the front. Returns whether a window was found.
    fn show_meeting_ui(&self) -> bool;

    /// Minimize the meeting window. Returns whether a window was found.
    fn hide_meeting_ui(&self) -> bool;

    /// Register a listener for `topic`.
    fn add_listener(&self, topic: Topic, listener: Arc<dyn NativeListener>);

    /// Unregister a listener previously passed to [`MeetingSdk::add_listener`].
    fn remove_listener(&self, topic: Topic, listener: &Arc<dyn NativeListener>);
}

/// Host-platform microphone permission dialogs.
pub trait PermissionGate: Send + Sync {
    /// Current permission status.
    fn check_microphone(&self) -> PermissionStatus;

    /// Ask the user for permission. The answer arrives as
    /// [`Callback::PermissionResult`].
    fn request_microphone(&self);
}

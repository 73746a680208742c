//! In-process stand-in for the native meeting SDK.
//!
//! Records every call, fans native events out to registered listeners and,
//! with `auto_respond` set, answers initialization, authentication and
//! meeting requests the way the real SDK does: results through the
//! callback sink, lifecycle changes as meeting status events. Tests drive
//! it by hand with `auto_respond` off.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use super::{
    AuthRequest, Callback, InitParams, MeetingSdk, NativeEvent, NativeListener, PermissionGate,
    PermissionStatus, SDK_SUCCESS,
};
use crate::bridge::CallbackSink;
use crate::config::SimulatorConfig;
use crate::models::options::MeetingOptions;
use crate::models::status::{AudioStatus, MeetingStatus, Topic};
use crate::{AppError, Result};

/// Error code the simulator reports for a meeting request without a number.
pub const INVALID_MEETING_NUMBER: i64 = 4;

/// Meeting settings received with a start or join request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeetingSettings {
    /// Meeting-view elements hidden, as a bitmask.
    pub views_options: u32,
    /// Video starts off.
    pub no_video: bool,
    /// Audio is not joined.
    pub no_audio: bool,
}

impl From<&MeetingOptions> for MeetingSettings {
    fn from(options: &MeetingOptions) -> Self {
        Self {
            views_options: options.meeting_views_options(),
            no_video: options.no_video,
            no_audio: options.no_audio,
        }
    }
}

/// One recorded SDK call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkCall {
    /// `initialize`.
    Initialize,
    /// `authenticate`.
    Authenticate,
    /// `logout`.
    Logout,
    /// `start_instant_meeting`.
    StartInstantMeeting(MeetingSettings),
    /// `start_meeting` with the meeting number.
    StartMeeting(String, MeetingSettings),
    /// `join_meeting` with the meeting number.
    JoinMeeting(String, MeetingSettings),
    /// `leave_meeting`.
    LeaveMeeting,
    /// `connect_audio`.
    ConnectAudio,
    /// `mute_my_audio` with the requested state.
    MuteMyAudio(bool),
    /// `show_meeting_ui`.
    ShowMeetingUi,
    /// `hide_meeting_ui`.
    HideMeetingUi,
}

#[derive(Debug, Default)]
struct SimState {
    initialized: bool,
    logged_in: bool,
    status: Option<MeetingStatus>,
    meeting: Option<(String, String)>,
    audio_connected: bool,
    muted: bool,
    meeting_error: Option<i64>,
    calls: Vec<SdkCall>,
}

type ListenerMap = HashMap<Topic, Vec<Arc<dyn NativeListener>>>;

/// Simulated [`MeetingSdk`].
pub struct SimulatedSdk {
    config: SimulatorConfig,
    callbacks: CallbackSink,
    state: Mutex<SimState>,
    listeners: Mutex<ListenerMap>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Random ten-digit meeting number, as the service assigns to instant meetings.
fn generate_meeting_number() -> String {
    let value = uuid::Uuid::new_v4().as_u128() % 9_000_000_000 + 1_000_000_000;
    value.to_string()
}

impl SimulatedSdk {
    /// Simulator reporting asynchronous results through `callbacks`.
    #[must_use]
    pub fn new(config: SimulatorConfig, callbacks: CallbackSink) -> Self {
        Self {
            config,
            callbacks,
            state: Mutex::new(SimState::default()),
            listeners: Mutex::new(HashMap::new()),
        }
    }

    /// Every call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<SdkCall> {
        lock(&self.state).calls.clone()
    }

    /// Number of recorded calls matching `call`.
    #[must_use]
    pub fn call_count(&self, call: &SdkCall) -> usize {
        lock(&self.state).calls.iter().filter(|c| *c == call).count()
    }

    /// Number of listeners registered for `topic`.
    #[must_use]
    pub fn listener_count(&self, topic: Topic) -> usize {
        lock(&self.listeners).get(&topic).map_or(0, Vec::len)
    }

    /// Make the next start or join request fail with `code`.
    pub fn fail_next_meeting(&self, code: i64) {
        lock(&self.state).meeting_error = Some(code);
    }

    /// Deliver the initialization result, as the native SDK would.
    pub fn complete_initialize(&self, error_code: i64) {
        if error_code == SDK_SUCCESS {
            lock(&self.state).initialized = true;
        }
        self.callbacks.deliver(Callback::InitializeResult {
            error_code,
            internal_error_code: 0,
        });
    }

    /// Deliver the authentication result, as the native SDK would.
    pub fn complete_authentication(&self, code: i64) {
        lock(&self.state).logged_in = code == SDK_SUCCESS;
        self.callbacks
            .deliver(Callback::AuthenticationResult { code });
    }

    /// Move to `status` and notify meeting status listeners.
    pub fn set_status(&self, status: MeetingStatus) {
        {
            let mut state = lock(&self.state);
            state.status = Some(status);
            if matches!(
                status,
                MeetingStatus::Idle | MeetingStatus::Ended | MeetingStatus::Failed
            ) {
                state.meeting = None;
                state.audio_connected = false;
            }
        }
        self.emit(NativeEvent::MeetingStatusChanged { status, code: 0 });
    }

    /// Report an audio change for `user_id` to device audio listeners.
    pub fn audio_event(&self, user_id: u64, status: AudioStatus) {
        self.emit(NativeEvent::UserAudioStatusChanged { user_id, status });
    }

    /// Invoke every listener registered for the event's topic.
    pub fn emit(&self, event: NativeEvent) {
        let listeners = lock(&self.listeners)
            .get(&event.topic())
            .cloned()
            .unwrap_or_default();
        trace!(?event, listeners = listeners.len(), "emitting native event");
        for listener in listeners {
            listener.on_event(&event);
        }
    }

    fn record(&self, call: SdkCall) {
        debug!(?call, "sdk call");
        lock(&self.state).calls.push(call);
    }

    fn enter_meeting(&self, number: String, password: String) -> Result<()> {
        {
            let mut state = lock(&self.state);
            if let Some(code) = state.meeting_error.take() {
                return Err(AppError::Sdk(code));
            }
            state.meeting = Some((number, password));
        }
        if self.config.auto_respond {
            self.set_status(MeetingStatus::Connecting);
            self.set_status(MeetingStatus::InMeeting);
        }
        Ok(())
    }
}

impl MeetingSdk for SimulatedSdk {
    fn initialize(&self, _params: &InitParams) -> Result<()> {
        self.record(SdkCall::Initialize);
        if self.config.auto_respond {
            self.complete_initialize(self.config.init_error_code);
        }
        Ok(())
    }

    fn authenticate(&self, _request: &AuthRequest) -> Result<()> {
        self.record(SdkCall::Authenticate);
        if self.config.auto_respond {
            self.complete_authentication(self.config.auth_result_code);
        }
        Ok(())
    }

    fn logout(&self) {
        self.record(SdkCall::Logout);
        lock(&self.state).logged_in = false;
        if self.config.auto_respond {
            self.callbacks
                .deliver(Callback::LogoutResult { code: SDK_SUCCESS });
        }
    }

    fn start_instant_meeting(&self, options: &MeetingOptions) -> Result<()> {
        self.record(SdkCall::StartInstantMeeting(options.into()));
        let password = generate_meeting_number()[..6].to_owned();
        self.enter_meeting(generate_meeting_number(), password)
    }

    fn start_meeting(&self, meeting_no: &str, options: &MeetingOptions) -> Result<()> {
        self.record(SdkCall::StartMeeting(meeting_no.to_owned(), options.into()));
        self.enter_meeting(meeting_no.to_owned(), String::new())
    }

    fn join_meeting(&self, options: &MeetingOptions) -> Result<()> {
        let number = options.meeting_id.clone().unwrap_or_default();
        self.record(SdkCall::JoinMeeting(number.clone(), options.into()));
        if number.is_empty() {
            return Err(AppError::Sdk(INVALID_MEETING_NUMBER));
        }
        let password = options.meeting_password.clone().unwrap_or_default();
        self.enter_meeting(number, password)
    }

    fn leave_meeting(&self) {
        self.record(SdkCall::LeaveMeeting);
        if self.config.auto_respond && lock(&self.state).meeting.is_some() {
            self.set_status(MeetingStatus::Disconnecting);
            self.set_status(MeetingStatus::Idle);
        }
    }

    fn meeting_status(&self) -> Option<MeetingStatus> {
        let state = lock(&self.state);
        state
            .initialized
            .then(|| state.status.unwrap_or(MeetingStatus::Idle))
    }

    fn meeting_credentials(&self) -> Option<(String, String)> {
        lock(&self.state).meeting.clone()
    }

    fn my_user_id(&self) -> Option<u64> {
        Some(self.config.local_user_id)
    }

    fn is_audio_connected(&self) -> bool {
        lock(&self.state).audio_connected
    }

    fn connect_audio(&self) -> Result<()> {
        self.record(SdkCall::ConnectAudio);
        lock(&self.state).audio_connected = true;
        Ok(())
    }

    fn is_my_audio_muted(&self) -> bool {
        lock(&self.state).muted
    }

    fn mute_my_audio(&self, mute: bool) -> Result<()> {
        self.record(SdkCall::MuteMyAudio(mute));
        lock(&self.state).muted = mute;
        Ok(())
    }

    fn show_meeting_ui(&self) -> bool {
        self.record(SdkCall::ShowMeetingUi);
        lock(&self.state).meeting.is_some()
    }

    fn hide_meeting_ui(&self) -> bool {
        self.record(SdkCall::HideMeetingUi);
        lock(&self.state).meeting.is_some()
    }

    fn add_listener(&self, topic: Topic, listener: Arc<dyn NativeListener>) {
        lock(&self.listeners).entry(topic).or_default().push(listener);
    }

    fn remove_listener(&self, topic: Topic, listener: &Arc<dyn NativeListener>) {
        if let Some(registered) = lock(&self.listeners).get_mut(&topic) {
            registered.retain(|candidate| !Arc::ptr_eq(candidate, listener));
        }
    }
}

/// Simulated [`PermissionGate`].
pub struct SimulatedPermissions {
    granted: AtomicBool,
    grant_on_request: bool,
    auto_respond: bool,
    callbacks: CallbackSink,
    requests: AtomicUsize,
}

impl SimulatedPermissions {
    /// Permission gate configured from `config`.
    #[must_use]
    pub fn new(config: &SimulatorConfig, callbacks: CallbackSink) -> Self {
        Self {
            granted: AtomicBool::new(config.microphone_granted),
            grant_on_request: config.grant_on_request,
            auto_respond: config.auto_respond,
            callbacks,
            requests: AtomicUsize::new(0),
        }
    }

    /// Number of permission requests shown so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Answer an outstanding request, as the user would.
    pub fn answer(&self, granted: bool) {
        if granted {
            self.granted.store(true, Ordering::SeqCst);
        }
        self.callbacks
            .deliver(Callback::PermissionResult { granted });
    }
}

impl PermissionGate for SimulatedPermissions {
    fn check_microphone(&self) -> PermissionStatus {
        if self.granted.load(Ordering::SeqCst) {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }

    fn request_microphone(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.auto_respond {
            self.answer(self.grant_on_request);
        }
    }
}

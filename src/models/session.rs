//! Session model and lifecycle transitions.
//!
//! [`Session`] is the bridge's view of the SDK lifecycle. It is owned by the
//! bridge task and changes only in response to SDK callbacks or an explicit
//! `logout` / `leave_meeting` command.

use serde::Serialize;

use crate::models::status::MeetingStatus;

/// Authentication state of the SDK user.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// Not logged in.
    Unauthenticated,
    /// Authentication requested; awaiting the SDK callback.
    Authenticating,
    /// Logged in.
    Authenticated,
}

/// Lifecycle phase of the meeting session.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No meeting.
    Idle,
    /// Starting, joining or reconnecting.
    Starting,
    /// In the meeting.
    Active,
    /// Leaving the meeting.
    Leaving,
}

/// Bridge-owned session state.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Session {
    /// Whether SDK initialization has succeeded.
    pub initialized: bool,
    /// Current authentication state.
    pub auth: AuthState,
    /// Current meeting phase.
    pub phase: SessionPhase,
    /// Meeting number of the current session, if any.
    pub current_session_id: Option<String>,
    /// Code attached by the last failed authentication.
    pub last_auth_error: Option<i64>,
    /// Last meeting status reported by the SDK.
    pub last_status: Option<MeetingStatus>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Fresh session as created at process start.
    #[must_use]
    pub fn new() -> Self {
        Self {
            initialized: false,
            auth: AuthState::Unauthenticated,
            phase: SessionPhase::Idle,
            current_session_id: None,
            last_auth_error: None,
            last_status: None,
        }
    }

    /// Record the SDK initialization result.
    ///
    /// Returns `true` when `code` reports success. A failed result never
    /// clears an earlier success.
    pub fn mark_initialized(&mut self, code: i64) -> bool {
        if code == 0 {
            self.initialized = true;
        }
        code == 0
    }

    /// Note that an authentication request has been issued.
    pub fn begin_auth(&mut self) {
        if self.auth == AuthState::Unauthenticated {
            self.auth = AuthState::Authenticating;
        }
    }

    /// Apply an authentication result code (`0` is success).
    pub fn transition_auth(&mut self, code: i64) {
        if code == 0 {
            self.auth = AuthState::Authenticated;
            self.last_auth_error = None;
        } else {
            self.auth = AuthState::Unauthenticated;
            self.last_auth_error = Some(code);
        }
    }

    /// Drop authentication after an explicit logout.
    pub fn logout(&mut self) {
        self.auth = AuthState::Unauthenticated;
    }

    /// Force the session back to `Idle` after an explicit leave.
    pub fn leave(&mut self) {
        self.phase = SessionPhase::Idle;
        self.current_session_id = None;
    }

    /// Whether the lifecycle permits moving from the current phase to `next`.
    #[must_use]
    pub fn can_transition_to(&self, next: SessionPhase) -> bool {
        matches!(
            (self.phase, next),
            (
                SessionPhase::Idle,
                SessionPhase::Starting | SessionPhase::Active
            ) | (
                SessionPhase::Starting,
                SessionPhase::Active | SessionPhase::Leaving | SessionPhase::Idle
            ) | (
                SessionPhase::Active,
                SessionPhase::Starting | SessionPhase::Leaving | SessionPhase::Idle
            ) | (SessionPhase::Leaving, SessionPhase::Idle)
        )
    }

    /// Apply a meeting status reported by the SDK.
    ///
    /// Returns the new phase when the status caused a transition, `None`
    /// when the phase is unchanged or the edge is not permitted.
    pub fn transition_session(&mut self, status: MeetingStatus) -> Option<SessionPhase> {
        self.last_status = Some(status);
        let next = status.phase()?;
        if !self.can_transition_to(next) {
            return None;
        }
        self.phase = next;
        if next == SessionPhase::Idle {
            self.current_session_id = None;
        }
        Some(next)
    }
}

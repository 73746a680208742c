//! SDK callback handling and chain effect execution.

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use super::pending::{respond, Responder};
use super::permission::{PermissionEffect, PermissionInput};
use super::workflow::{ActionOutcome, ChainAction, ChainEffect, ChainInput};
use super::Bridge;
use crate::models::session::{AuthState, SessionPhase};
use crate::models::status::MeetingStatus;
use crate::sdk::{Callback, SDK_SUCCESS};
use crate::AppError;

/// Code reported when the SDK rejects a call without one of its own.
const UNCLASSIFIED_ERROR: i64 = -1;

fn error_code(err: &AppError) -> i64 {
    match err {
        AppError::Sdk(code) => *code,
        _ => UNCLASSIFIED_ERROR,
    }
}

impl Bridge {
    pub(crate) fn on_callback(&mut self, callback: Callback) {
        match callback {
            Callback::InitializeResult {
                error_code,
                internal_error_code,
            } => {
                if self.session.mark_initialized(error_code) {
                    info!("sdk initialized");
                    self.register_tracker();
                } else {
                    warn!(error_code, internal_error_code, "sdk initialization failed");
                }
                self.advance_chain(
                    ChainInput::InitResult {
                        error_code,
                        internal_error_code,
                    },
                    None,
                );
            }
            Callback::AuthenticationResult { code } => {
                self.session.transition_auth(code);
                if code == SDK_SUCCESS {
                    info!("authenticated");
                } else {
                    warn!(code, "authentication failed");
                }
                self.advance_chain(ChainInput::AuthResult { code }, None);
            }
            Callback::LogoutResult { code } => {
                debug!(code, "logout finished");
                self.session.logout();
            }
            Callback::MeetingStatusChanged { status, code } => {
                self.on_meeting_status(status, code);
            }
            Callback::PermissionResult { granted } => {
                self.advance_permission(PermissionInput::GrantResult { granted });
            }
        }
    }

    fn on_meeting_status(&mut self, status: MeetingStatus, code: i64) {
        let entering = matches!(
            status.phase(),
            Some(SessionPhase::Starting | SessionPhase::Active)
        );
        if entering && !self.meeting_expected {
            debug!(%status, code, "status from an abandoned meeting; ignoring");
            return;
        }

        let Some(phase) = self.session.transition_session(status) else {
            debug!(%status, code, "meeting status without phase change");
            return;
        };
        info!(%status, ?phase, "session phase changed");

        match phase {
            SessionPhase::Starting | SessionPhase::Active => {
                if self.session.current_session_id.is_none() {
                    self.session.current_session_id = self
                        .sdk
                        .meeting_credentials()
                        .map(|(number, _)| number)
                        .or_else(|| self.requested_meeting.clone());
                }
            }
            SessionPhase::Idle => {
                self.requested_meeting = None;
                self.meeting_expected = false;
                self.permission.reset();
            }
            SessionPhase::Leaving => {}
        }

        if phase == SessionPhase::Active {
            let status = self.permissions.check_microphone();
            self.advance_permission(PermissionInput::SessionActive(status));
        }
    }

    /// Feed `input` to the auth chain and run its effects until it waits
    /// for another callback. A `direct` responder takes the chain's reply
    /// instead of the pending slot.
    pub(crate) fn advance_chain(&mut self, input: ChainInput, mut direct: Option<Responder>) {
        let mut effects: VecDeque<ChainEffect> = self.chain.step(input).into();

        while let Some(effect) = effects.pop_front() {
            match effect {
                ChainEffect::Initialize(params) => {
                    debug!(domain = %params.domain, "initializing sdk");
                    if let Err(err) = self.sdk.initialize(&params) {
                        warn!(%err, "sdk rejected initialization");
                        effects.extend(self.chain.step(ChainInput::InitResult {
                            error_code: error_code(&err),
                            internal_error_code: 0,
                        }));
                    }
                }
                ChainEffect::Authenticate(request) => {
                    debug!(user = ?request.user_id, "authenticating");
                    self.session.begin_auth();
                    if let Err(err) = self.sdk.authenticate(&request) {
                        warn!(%err, "sdk rejected authentication");
                        let code = error_code(&err);
                        self.session.transition_auth(code);
                        effects.extend(self.chain.step(ChainInput::AuthResult { code }));
                    }
                }
                ChainEffect::Invoke(action) => {
                    let outcome = self.invoke(&action);
                    effects.extend(self.chain.step(ChainInput::ActionResult(outcome)));
                }
                ChainEffect::Resolve(reply) => match direct.take() {
                    Some(responder) => respond(responder, reply),
                    None => {
                        self.pending.resolve(reply);
                    }
                },
            }
        }

        if direct.is_some() {
            warn!(stage = ?self.chain.stage(), "chain suspended without a parked result");
        }
    }

    fn invoke(&mut self, action: &ChainAction) -> ActionOutcome {
        if action.requires_login() && self.session.auth != AuthState::Authenticated {
            warn!("action requires a logged-in user");
            return ActionOutcome::LoginRequired;
        }

        self.requested_meeting = action.meeting_id().map(str::to_owned);
        self.meeting_expected = true;
        let result = match action {
            ChainAction::StartInstant(options) => self.sdk.start_instant_meeting(options),
            ChainAction::StartMeeting {
                meeting_no,
                options,
            } => self.sdk.start_meeting(meeting_no, options),
            ChainAction::Join(options) => self.sdk.join_meeting(options),
        };

        match result {
            Ok(()) => {
                info!(meeting = ?self.requested_meeting, "meeting request accepted");
                ActionOutcome::Completed
            }
            Err(err) => {
                warn!(%err, "meeting request failed");
                self.meeting_expected = false;
                ActionOutcome::Failed(error_code(&err))
            }
        }
    }

    pub(crate) fn advance_permission(&mut self, input: PermissionInput) {
        match self.permission.step(input) {
            Some(PermissionEffect::RequestPermission) => {
                debug!("requesting microphone permission");
                self.permissions.request_microphone();
            }
            Some(PermissionEffect::ConnectAudio) => {
                if self.session.phase != SessionPhase::Active {
                    debug!(phase = ?self.session.phase, "session not active; skipping audio");
                } else if self.sdk.is_audio_connected() {
                    debug!("audio already connected");
                } else if let Err(err) = self.sdk.connect_audio() {
                    warn!(%err, "failed to connect audio");
                } else {
                    info!("audio connected");
                }
            }
            None => {}
        }
    }
}

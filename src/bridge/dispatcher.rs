//! Command dispatch.
//!
//! Routes each host command to its handler. Session-mutating commands go
//! through the initialization and pending-slot checks first; queries answer
//! straight from session and SDK state.

use tracing::{debug, info, warn};

use super::pending::{respond, Responder};
use super::workflow::{ChainAction, ChainInput, ChainPlan};
use super::Bridge;
use crate::models::command::{Command, CommandKind};
use crate::models::options::MeetingOptions;
use crate::models::reply::{Reply, AUDIO_ERROR, INVALID_ARGUMENTS, MEETING_ERROR};
use crate::models::session::AuthState;
use crate::sdk::{AuthRequest, InitParams, SDK_SUCCESS};
use crate::AppError;

impl Bridge {
    /// Handle one command. Every path answers `responder` exactly once,
    /// either now or when the chain it starts resolves.
    pub(crate) fn dispatch(&mut self, command: Command, responder: Responder) {
        let Some(kind) = command.kind() else {
            warn!(name = %command.name, "command not implemented");
            respond(responder, Reply::NotImplemented);
            return;
        };
        debug!(command = %kind, mutating = kind.is_session_mutating(), "dispatching");

        match kind {
            CommandKind::Init => self.init(&command, responder),
            CommandKind::Login => self.login(&command, responder),
            CommandKind::StartNormal => self.start_normal(&command, responder),
            CommandKind::Join => self.join(&command, responder),
            CommandKind::InitAndJoin => self.init_and_join(&command, responder),
            CommandKind::MeetingStatus => respond(responder, self.meeting_status()),
            CommandKind::MeetingDetails => respond(responder, self.meeting_details()),
            CommandKind::Logout => respond(responder, self.logout()),
            CommandKind::LeaveMeeting => respond(responder, self.leave_meeting()),
            CommandKind::ShowMeeting => respond(responder, self.show_meeting(true)),
            CommandKind::HideMeeting => respond(responder, self.show_meeting(false)),
            CommandKind::GetMicStatus => respond(responder, self.mic_status()),
            CommandKind::MuteMyAudio => respond(responder, self.mute_my_audio(&command)),
        }
    }

    /// Reply for a session-mutating command that arrives while the slot or
    /// the chain is busy.
    fn busy_reply(&self) -> Option<Reply> {
        if let Some(held) = self.pending.held() {
            return Some(Reply::already_pending(held.as_str()));
        }
        if !self.chain.is_idle() {
            return Some(Reply::already_pending("workflow"));
        }
        None
    }

    /// Reject with the uninitialized or busy reply, if either applies.
    fn admit(&self, kind: CommandKind) -> Option<Reply> {
        if !self.session.initialized {
            debug!(command = %kind, error = %AppError::NotInitialized, "rejecting");
            return Some(Reply::sdk_error());
        }
        self.busy_reply()
    }

    /// Park `responder` and start `plan`, or run `plan` to completion at
    /// once when it needs no callback.
    fn begin_chain(&mut self, kind: CommandKind, plan: ChainPlan, responder: Responder) {
        if plan.init.is_none() && plan.auth.is_none() {
            debug!(command = %kind, "no callback needed; invoking directly");
            self.advance_chain(ChainInput::Begin(plan), Some(responder));
            return;
        }

        match self.pending.park(responder, kind) {
            Ok(()) => self.advance_chain(ChainInput::Begin(plan), None),
            Err(rejected) => {
                debug!(error = %rejected.error, "park rejected");
                let held = self.pending.held().map_or("workflow", CommandKind::as_str);
                respond(rejected.responder, Reply::already_pending(held));
            }
        }
    }

    fn init_params(&self, command: &Command) -> InitParams {
        InitParams {
            app_key: command
                .arg("appKey")
                .map(str::to_owned)
                .or_else(|| self.settings.app_key.clone()),
            app_secret: command
                .arg("appSecret")
                .map(str::to_owned)
                .or_else(|| self.settings.app_secret.clone()),
            jwt_token: command.arg("jwtToken").map(str::to_owned),
            domain: command
                .arg("domain")
                .map_or_else(|| self.settings.domain.clone(), str::to_owned),
            enable_log: self.settings.enable_log,
        }
    }

    /// Authentication step, skipped for an already authenticated session.
    fn auth_step(&self, command: &Command) -> Option<AuthRequest> {
        (self.session.auth != AuthState::Authenticated).then(|| AuthRequest {
            user_id: command.arg("userId").map(str::to_owned),
            password: command.arg("userPassword").map(str::to_owned),
        })
    }

    fn init(&mut self, command: &Command, responder: Responder) {
        if self.session.initialized {
            debug!("sdk already initialized");
            respond(responder, Reply::Codes(SDK_SUCCESS, 0));
            return;
        }
        if let Some(reply) = self.busy_reply() {
            respond(responder, reply);
            return;
        }

        let params = self.init_params(command);
        if !params.has_credentials() {
            warn!("init requested without credentials");
            respond(responder, Reply::Codes(INVALID_ARGUMENTS, 0));
            return;
        }

        let plan = ChainPlan {
            init: Some(params),
            ..ChainPlan::default()
        };
        self.begin_chain(CommandKind::Init, plan, responder);
    }

    fn login(&mut self, command: &Command, responder: Responder) {
        if let Some(reply) = self.admit(CommandKind::Login) {
            respond(responder, reply);
            return;
        }

        let plan = ChainPlan {
            init: None,
            auth: self.auth_step(command),
            action: Some(ChainAction::StartInstant(MeetingOptions::from_command(
                command,
            ))),
        };
        self.begin_chain(CommandKind::Login, plan, responder);
    }

    fn start_normal(&mut self, command: &Command, responder: Responder) {
        if let Some(reply) = self.admit(CommandKind::StartNormal) {
            respond(responder, reply);
            return;
        }

        let options = MeetingOptions::from_command(command);
        let Some(meeting_no) = options.meeting_id.clone() else {
            warn!("start_normal without meetingId");
            respond(responder, Reply::pair(MEETING_ERROR, "meetingId required"));
            return;
        };

        let plan = ChainPlan {
            init: None,
            auth: self.auth_step(command),
            action: Some(ChainAction::StartMeeting {
                meeting_no,
                options,
            }),
        };
        self.begin_chain(CommandKind::StartNormal, plan, responder);
    }

    fn join(&mut self, command: &Command, responder: Responder) {
        if let Some(reply) = self.admit(CommandKind::Join) {
            respond(responder, reply);
            return;
        }

        let options = MeetingOptions::from_command(command);
        if options.meeting_id.is_none() {
            warn!("join without meetingId");
            respond(responder, Reply::Flag(false));
            return;
        }

        let plan = ChainPlan {
            action: Some(ChainAction::Join(options)),
            ..ChainPlan::default()
        };
        self.begin_chain(CommandKind::Join, plan, responder);
    }

    fn init_and_join(&mut self, command: &Command, responder: Responder) {
        if let Some(reply) = self.busy_reply() {
            respond(responder, reply);
            return;
        }

        let options = MeetingOptions::from_command(command);
        if options.meeting_id.is_none() {
            warn!("init_and_join without meetingId");
            respond(responder, Reply::Flag(false));
            return;
        }

        let init = if self.session.initialized {
            None
        } else {
            let params = self.init_params(command);
            if !params.has_credentials() {
                warn!("init_and_join requested without credentials");
                respond(responder, Reply::Flag(false));
                return;
            }
            Some(params)
        };

        let plan = ChainPlan {
            init,
            auth: self.auth_step(command),
            action: Some(ChainAction::Join(options)),
        };
        self.begin_chain(CommandKind::InitAndJoin, plan, responder);
    }

    fn meeting_status(&self) -> Reply {
        if !self.session.initialized {
            return Reply::status_unknown("SDK not initialized");
        }
        match self.sdk.meeting_status() {
            Some(status) => Reply::pair(status.as_str(), ""),
            None => Reply::status_unknown("No status available"),
        }
    }

    fn meeting_details(&self) -> Reply {
        if !self.session.initialized {
            return Reply::status_unknown("SDK not initialized");
        }
        match self.sdk.meeting_credentials() {
            Some((number, password)) => Reply::Pair(number, password),
            None => Reply::status_unknown("No status available"),
        }
    }

    fn logout(&mut self) -> Reply {
        if self.session.initialized {
            self.sdk.logout();
        }
        self.session.logout();
        info!("logged out");
        Reply::Empty
    }

    fn leave_meeting(&mut self) -> Reply {
        if self.session.initialized {
            self.sdk.leave_meeting();
        }
        self.session.leave();
        self.requested_meeting = None;
        self.meeting_expected = false;
        self.permission.reset();
        info!("left meeting");
        Reply::Empty
    }

    fn show_meeting(&self, show: bool) -> Reply {
        if !self.session.initialized {
            return Reply::sdk_error();
        }
        let found = if show {
            self.sdk.show_meeting_ui()
        } else {
            self.sdk.hide_meeting_ui()
        };
        if found {
            Reply::Flag(true)
        } else {
            debug!(show, "no meeting window");
            Reply::sdk_error()
        }
    }

    fn mic_status(&self) -> Reply {
        if !self.session.initialized {
            return Reply::sdk_error();
        }
        Reply::Flag(self.sdk.is_my_audio_muted())
    }

    fn mute_my_audio(&self, command: &Command) -> Reply {
        if !self.session.initialized {
            return Reply::sdk_error();
        }
        let mute = command
            .arg("mute")
            .is_some_and(|value| value.eq_ignore_ascii_case("true"));
        match self.sdk.mute_my_audio(mute) {
            Ok(()) => Reply::Flag(mute),
            Err(AppError::Sdk(code)) => Reply::pair(AUDIO_ERROR, code.to_string()),
            Err(err) => Reply::pair(AUDIO_ERROR, err.to_string()),
        }
    }
}

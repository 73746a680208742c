//! Authentication-then-action workflow chain.
//!
//! [`AuthChain`] is a pure transition table: SDK outcomes go in as
//! [`ChainInput`]s and the chain answers with [`ChainEffect`]s for the
//! bridge to carry out. The chain never touches the SDK itself, so the
//! table can be exercised with synthetic inputs.
//!
//! ```text
//! Idle ──init──▶ AwaitingInit ──ok──▶ AwaitingAuth ──ok──▶ AwaitingActionResult ──▶ Idle
//!   │                 │ err              │ err                      ▲
//!   │                 ▼                  ▼                          │
//!   │               Idle               Idle                         │
//!   └──────────── already authenticated ────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::debug;

use crate::models::options::MeetingOptions;
use crate::models::reply::Reply;
use crate::sdk::{AuthRequest, InitParams, SDK_SUCCESS};

/// Session-mutating action performed at the end of a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainAction {
    /// Start an instant meeting as the logged-in user.
    StartInstant(MeetingOptions),
    /// Start a meeting by number as the logged-in user.
    StartMeeting {
        /// Meeting number.
        meeting_no: String,
        /// Meeting options.
        options: MeetingOptions,
    },
    /// Join a meeting.
    Join(MeetingOptions),
}

/// Outcome of invoking a [`ChainAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The SDK accepted the request.
    Completed,
    /// The SDK rejected the request with a code.
    Failed(i64),
    /// The action needs a logged-in user and there is none.
    LoginRequired,
}

impl ChainAction {
    /// Whether the action may only run for an authenticated user.
    #[must_use]
    pub fn requires_login(&self) -> bool {
        !matches!(self, Self::Join(_))
    }

    /// Meeting number the action targets, when known up front.
    #[must_use]
    pub fn meeting_id(&self) -> Option<&str> {
        match self {
            Self::StartInstant(_) => None,
            Self::StartMeeting { meeting_no, .. } => Some(meeting_no),
            Self::Join(options) => options.meeting_id.as_deref(),
        }
    }

    /// Reply for an invoked action.
    #[must_use]
    pub fn reply_for(&self, outcome: ActionOutcome) -> Reply {
        match (self, outcome) {
            (Self::Join(_), ActionOutcome::Completed) => Reply::Flag(true),
            (Self::Join(_), _) => Reply::Flag(false),
            (_, ActionOutcome::Completed) => Reply::meeting_success(),
            (_, ActionOutcome::Failed(code)) => Reply::meeting_error(code),
            (_, ActionOutcome::LoginRequired) => Reply::login_required(),
        }
    }

    /// Reply when authentication fails before the action could run.
    #[must_use]
    pub fn auth_failure_reply(&self, code: i64) -> Reply {
        match self {
            Self::Join(_) => Reply::Flag(false),
            _ => Reply::login_error(code),
        }
    }

    /// Reply when initialization fails before the action could run.
    #[must_use]
    pub fn init_failure_reply(&self, error_code: i64, internal_error_code: i64) -> Reply {
        match self {
            Self::Join(_) => Reply::Flag(false),
            _ => Reply::Codes(error_code, internal_error_code),
        }
    }
}

/// Steps one command asks the chain to run. Absent steps are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainPlan {
    /// Initialize the SDK first.
    pub init: Option<InitParams>,
    /// Authenticate before the action.
    pub auth: Option<AuthRequest>,
    /// Final action; without one the chain resolves with the init codes.
    pub action: Option<ChainAction>,
}

/// Inputs that advance the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainInput {
    /// A command starts a new chain.
    Begin(ChainPlan),
    /// The SDK reported the initialization result.
    InitResult {
        /// SDK error code.
        error_code: i64,
        /// SDK-internal error code.
        internal_error_code: i64,
    },
    /// The SDK reported the authentication result.
    AuthResult {
        /// Authentication result code.
        code: i64,
    },
    /// The bridge invoked the action.
    ActionResult(ActionOutcome),
}

/// Work the chain hands back to the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEffect {
    /// Call [`MeetingSdk::initialize`](crate::sdk::MeetingSdk::initialize).
    Initialize(InitParams),
    /// Call [`MeetingSdk::authenticate`](crate::sdk::MeetingSdk::authenticate).
    Authenticate(AuthRequest),
    /// Perform the action and feed back [`ChainInput::ActionResult`].
    Invoke(ChainAction),
    /// Resolve the command's responder.
    Resolve(Reply),
}

/// Externally visible chain position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainStage {
    /// No chain in progress.
    Idle,
    /// Waiting for the initialization callback.
    AwaitingInit,
    /// Waiting for the authentication callback.
    AwaitingAuth,
    /// Waiting for the action outcome.
    AwaitingActionResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ChainState {
    Idle,
    AwaitingInit {
        auth: Option<AuthRequest>,
        action: Option<ChainAction>,
    },
    AwaitingAuth {
        action: ChainAction,
    },
    AwaitingActionResult {
        action: ChainAction,
    },
}

impl ChainState {
    fn stage(&self) -> ChainStage {
        match self {
            Self::Idle => ChainStage::Idle,
            Self::AwaitingInit { .. } => ChainStage::AwaitingInit,
            Self::AwaitingAuth { .. } => ChainStage::AwaitingAuth,
            Self::AwaitingActionResult { .. } => ChainStage::AwaitingActionResult,
        }
    }
}

/// The resumable authenticate-then-act continuation. At most one exists.
#[derive(Debug)]
pub struct AuthChain {
    state: ChainState,
}

impl Default for AuthChain {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthChain {
    /// Idle chain.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ChainState::Idle,
        }
    }

    /// Current chain position.
    #[must_use]
    pub fn stage(&self) -> ChainStage {
        self.state.stage()
    }

    /// Whether no chain is in progress.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == ChainState::Idle
    }

    /// Apply one input and return the effects to carry out, in order.
    ///
    /// Inputs the current state does not expect (a second `Begin`, a late or
    /// duplicate callback) leave the state unchanged and produce no effects.
    pub fn step(&mut self, input: ChainInput) -> Vec<ChainEffect> {
        let state = std::mem::replace(&mut self.state, ChainState::Idle);

        let (next, effects) = match (state, input) {
            (ChainState::Idle, ChainInput::Begin(plan)) => Self::begin(plan),
            (
                ChainState::AwaitingInit { auth, action },
                ChainInput::InitResult {
                    error_code,
                    internal_error_code,
                },
            ) => {
                if error_code == SDK_SUCCESS {
                    Self::after_init(auth, action, internal_error_code)
                } else {
                    let reply = action.map_or(
                        Reply::Codes(error_code, internal_error_code),
                        |action| action.init_failure_reply(error_code, internal_error_code),
                    );
                    (ChainState::Idle, vec![ChainEffect::Resolve(reply)])
                }
            }
            (ChainState::AwaitingAuth { action }, ChainInput::AuthResult { code }) => {
                if code == SDK_SUCCESS {
                    (
                        ChainState::AwaitingActionResult {
                            action: action.clone(),
                        },
                        vec![ChainEffect::Invoke(action)],
                    )
                } else {
                    let reply = action.auth_failure_reply(code);
                    (ChainState::Idle, vec![ChainEffect::Resolve(reply)])
                }
            }
            (ChainState::AwaitingActionResult { action }, ChainInput::ActionResult(outcome)) => (
                ChainState::Idle,
                vec![ChainEffect::Resolve(action.reply_for(outcome))],
            ),
            (state, input) => {
                debug!(stage = ?state.stage(), ?input, "chain input not expected; ignoring");
                (state, Vec::new())
            }
        };

        self.state = next;
        effects
    }

    fn begin(plan: ChainPlan) -> (ChainState, Vec<ChainEffect>) {
        match plan.init {
            Some(params) => (
                ChainState::AwaitingInit {
                    auth: plan.auth,
                    action: plan.action,
                },
                vec![ChainEffect::Initialize(params)],
            ),
            None => Self::after_init(plan.auth, plan.action, 0),
        }
    }

    fn after_init(
        auth: Option<AuthRequest>,
        action: Option<ChainAction>,
        internal_error_code: i64,
    ) -> (ChainState, Vec<ChainEffect>) {
        match (auth, action) {
            (_, None) => (
                ChainState::Idle,
                vec![ChainEffect::Resolve(Reply::Codes(
                    SDK_SUCCESS,
                    internal_error_code,
                ))],
            ),
            (Some(request), Some(action)) => (
                ChainState::AwaitingAuth { action },
                vec![ChainEffect::Authenticate(request)],
            ),
            (None, Some(action)) => (
                ChainState::AwaitingActionResult {
                    action: action.clone(),
                },
                vec![ChainEffect::Invoke(action)],
            ),
        }
    }
}

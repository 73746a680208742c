//! The coordination core.
//!
//! A single [`Bridge`] task owns the [`Session`], the pending-result slot
//! and both workflow chains. Commands and SDK callbacks reach it through one
//! FIFO inbox, so every state mutation happens on one logical context and
//! no lock guards bridge state.

pub mod callbacks;
pub mod dispatcher;
pub mod handle;
pub mod pending;
pub mod permission;
pub mod tracker;
pub mod workflow;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};

use crate::config::GlobalConfig;
use crate::models::command::Command;
use crate::models::session::Session;
use crate::models::status::Topic;
use crate::sdk::{Callback, MeetingSdk, NativeListener, PermissionGate};

pub use handle::{channel, BridgeHandle, BridgeInbox, CallbackSink};

use self::pending::{PendingResult, Responder};
use self::permission::{PermissionChain, PermissionStage};
use self::workflow::{AuthChain, ChainStage};

/// Messages carried by the bridge inbox.
#[derive(Debug)]
pub(crate) enum BridgeInput {
    /// A host command and the responder for its reply.
    Command(Command, Responder),
    /// An asynchronous SDK or platform result.
    Callback(Callback),
    /// A request for a copy of the bridge state.
    Snapshot(oneshot::Sender<BridgeSnapshot>),
}

/// Static settings the bridge falls back to when a command omits them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSettings {
    /// Default web domain for initialization.
    pub domain: String,
    /// Whether the SDK writes its own log files.
    pub enable_log: bool,
    /// Application key from the credential store.
    pub app_key: Option<String>,
    /// Application secret from the credential store.
    pub app_secret: Option<String>,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            domain: "zoom.us".into(),
            enable_log: true,
            app_key: None,
            app_secret: None,
        }
    }
}

impl From<&GlobalConfig> for BridgeSettings {
    fn from(config: &GlobalConfig) -> Self {
        Self {
            domain: config.sdk.domain.clone(),
            enable_log: config.sdk.enable_log,
            app_key: config.sdk.app_key.clone(),
            app_secret: config.sdk.app_secret.clone(),
        }
    }
}

/// Point-in-time copy of the bridge state, for diagnostics and tests.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BridgeSnapshot {
    /// Session state.
    pub session: Session,
    /// Command holding the pending-result slot.
    pub pending: Option<String>,
    /// Auth chain position.
    pub chain: ChainStage,
    /// Permission chain position.
    pub permission: PermissionStage,
}

/// Owner of all bridge state. Runs as one task; see [`Bridge::run`].
pub struct Bridge {
    sdk: Arc<dyn MeetingSdk>,
    permissions: Arc<dyn PermissionGate>,
    settings: BridgeSettings,
    callbacks: CallbackSink,
    session: Session,
    pending: PendingResult,
    chain: AuthChain,
    permission: PermissionChain,
    tracker: Option<Arc<dyn NativeListener>>,
    requested_meeting: Option<String>,
    /// Set when a start or join is invoked; cleared by leave and by the
    /// session returning to idle. Starting and active statuses are only
    /// honoured while set.
    meeting_expected: bool,
}

impl Bridge {
    /// Build a bridge over `sdk`. `callbacks` must feed the inbox this
    /// bridge will run on; the session tracker reports through it.
    #[must_use]
    pub fn new(
        sdk: Arc<dyn MeetingSdk>,
        permissions: Arc<dyn PermissionGate>,
        settings: BridgeSettings,
        callbacks: CallbackSink,
    ) -> Self {
        Self {
            sdk,
            permissions,
            settings,
            callbacks,
            session: Session::new(),
            pending: PendingResult::new(),
            chain: AuthChain::new(),
            permission: PermissionChain::new(),
            tracker: None,
            requested_meeting: None,
            meeting_expected: false,
        }
    }

    /// Spawn [`Bridge::run`] on the current runtime.
    #[must_use]
    pub fn spawn(self, inbox: BridgeInbox, ct: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(inbox, ct).instrument(info_span!("bridge")))
    }

    /// Process inbox messages in arrival order until cancellation or until
    /// every handle is gone, then unregister the session tracker.
    pub async fn run(mut self, mut inbox: BridgeInbox, ct: CancellationToken) {
        info!("bridge started");

        loop {
            tokio::select! {
                () = ct.cancelled() => {
                    info!("bridge shutting down");
                    break;
                }
                input = inbox.recv() => {
                    let Some(input) = input else {
                        info!("bridge inbox closed");
                        break;
                    };
                    self.handle_input(input);
                }
            }
        }

        self.teardown();
    }

    fn handle_input(&mut self, input: BridgeInput) {
        match input {
            BridgeInput::Command(command, responder) => self.dispatch(command, responder),
            BridgeInput::Callback(callback) => self.on_callback(callback),
            BridgeInput::Snapshot(reply) => {
                if reply.send(self.snapshot()).is_err() {
                    debug!("snapshot requester dropped");
                }
            }
        }
    }

    fn snapshot(&self) -> BridgeSnapshot {
        BridgeSnapshot {
            session: self.session.clone(),
            pending: self.pending.held().map(|kind| kind.as_str().to_owned()),
            chain: self.chain.stage(),
            permission: self.permission.stage(),
        }
    }

    fn register_tracker(&mut self) {
        if self.tracker.is_some() {
            return;
        }
        let listener: Arc<dyn NativeListener> =
            Arc::new(tracker::SessionTracker::new(self.callbacks.clone()));
        self.sdk
            .add_listener(Topic::MeetingStatus, Arc::clone(&listener));
        self.tracker = Some(listener);
        debug!("session tracker registered");
    }

    fn teardown(&mut self) {
        if let Some(listener) = self.tracker.take() {
            self.sdk.remove_listener(Topic::MeetingStatus, &listener);
            debug!("session tracker unregistered");
        }
        if let Some(held) = self.pending.held() {
            debug!(command = %held, "dropping parked result on shutdown");
        }
    }
}

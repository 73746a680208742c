//! Permission-gated audio connection.
//!
//! Entering an active meeting checks the microphone permission. A granted
//! permission connects VoIP audio at once; otherwise the chain asks the
//! user and connects only if the answer is a grant. A denial ends the chain
//! quietly: audio is an enhancement, not a condition for being in session.

use serde::Serialize;
use tracing::debug;

use crate::sdk::PermissionStatus;

/// Inputs that advance the permission chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionInput {
    /// The session entered the active phase; carries the current permission.
    SessionActive(PermissionStatus),
    /// The user answered the permission request.
    GrantResult {
        /// Whether permission was granted.
        granted: bool,
    },
}

/// Work the permission chain hands back to the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionEffect {
    /// Show the OS permission request.
    RequestPermission,
    /// Connect meeting audio if it is not connected yet.
    ConnectAudio,
}

/// Externally visible permission chain position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStage {
    /// Nothing outstanding.
    Idle,
    /// Waiting for the user's answer.
    AwaitingGrant,
}

/// State machine for the permission-gated side effect.
#[derive(Debug)]
pub struct PermissionChain {
    stage: PermissionStage,
}

impl Default for PermissionChain {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionChain {
    /// Idle chain.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stage: PermissionStage::Idle,
        }
    }

    /// Current position.
    #[must_use]
    pub fn stage(&self) -> PermissionStage {
        self.stage
    }

    /// Drop any outstanding request. A grant arriving afterwards is ignored.
    pub fn reset(&mut self) {
        if self.stage == PermissionStage::AwaitingGrant {
            debug!("abandoning outstanding permission request");
        }
        self.stage = PermissionStage::Idle;
    }

    /// Apply one input and return the effect to carry out, if any.
    pub fn step(&mut self, input: PermissionInput) -> Option<PermissionEffect> {
        match (self.stage, input) {
            (_, PermissionInput::SessionActive(PermissionStatus::Granted)) => {
                self.stage = PermissionStage::Idle;
                Some(PermissionEffect::ConnectAudio)
            }
            (PermissionStage::Idle, PermissionInput::SessionActive(PermissionStatus::Denied)) => {
                self.stage = PermissionStage::AwaitingGrant;
                Some(PermissionEffect::RequestPermission)
            }
            (
                PermissionStage::AwaitingGrant,
                PermissionInput::SessionActive(PermissionStatus::Denied),
            ) => None,
            (PermissionStage::AwaitingGrant, PermissionInput::GrantResult { granted }) => {
                self.stage = PermissionStage::Idle;
                if granted {
                    Some(PermissionEffect::ConnectAudio)
                } else {
                    debug!("microphone permission denied; audio stays disconnected");
                    None
                }
            }
            (PermissionStage::Idle, PermissionInput::GrantResult { granted }) => {
                debug!(granted, "permission result without a pending request; ignoring");
                None
            }
        }
    }
}

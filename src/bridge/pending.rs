//! Single-slot pending-result arbiter.
//!
//! Holds at most one responder waiting for an SDK callback. A second
//! command that needs to park is rejected, never queued, and every parked
//! responder is resolved at most once.

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::models::command::CommandKind;
use crate::models::reply::Reply;
use crate::AppError;

/// Sending half handed to the bridge with every command.
pub type Responder = oneshot::Sender<Reply>;

/// A failed [`PendingResult::park`]; hands the responder back so the caller
/// can still answer it.
#[derive(Debug)]
pub struct Rejected {
    /// The responder that could not be parked.
    pub responder: Responder,
    /// Always [`AppError::AlreadyPending`] naming the held command.
    pub error: AppError,
}

#[derive(Debug)]
struct Parked {
    responder: Responder,
    tag: CommandKind,
}

/// Exclusively-owned optional slot for one outstanding responder.
#[derive(Debug, Default)]
pub struct PendingResult {
    slot: Option<Parked>,
}

impl PendingResult {
    /// Empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a responder is parked.
    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.slot.is_some()
    }

    /// Command that parked the current responder.
    #[must_use]
    pub fn held(&self) -> Option<CommandKind> {
        self.slot.as_ref().map(|parked| parked.tag)
    }

    /// Park `responder` on behalf of `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`Rejected`] carrying [`AppError::AlreadyPending`] if the slot
    /// is occupied; the parked responder is left untouched.
    pub fn park(&mut self, responder: Responder, tag: CommandKind) -> Result<(), Rejected> {
        if let Some(ref parked) = self.slot {
            return Err(Rejected {
                responder,
                error: AppError::AlreadyPending(parked.tag.as_str().to_owned()),
            });
        }
        debug!(command = %tag, "parking result");
        self.slot = Some(Parked { responder, tag });
        Ok(())
    }

    /// Deliver `reply` to the parked responder and clear the slot.
    ///
    /// An empty slot makes this a no-op, which absorbs duplicate and late
    /// callbacks. Returns whether a responder was resolved.
    pub fn resolve(&mut self, reply: Reply) -> bool {
        let Some(parked) = self.slot.take() else {
            debug!(?reply, "no parked result; dropping reply");
            return false;
        };
        debug!(
            command = %parked.tag,
            success = reply.is_success(),
            ?reply,
            "resolving parked result"
        );
        if parked.responder.send(reply).is_err() {
            warn!(command = %parked.tag, "parked caller already gone");
        }
        true
    }
}

/// Answer a responder directly, logging if the caller has gone away.
pub fn respond(responder: Responder, reply: Reply) {
    debug!(success = reply.is_success(), ?reply, "replying");
    if responder.send(reply).is_err() {
        warn!("command caller dropped before reply");
    }
}

//! Cloneable entry points into the bridge task.

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::{BridgeInput, BridgeSnapshot};
use crate::models::command::Command;
use crate::models::reply::Reply;
use crate::sdk::Callback;
use crate::{AppError, Result};

/// Create the bridge inbox and the handle that feeds it.
#[must_use]
pub fn channel() -> (BridgeHandle, BridgeInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (BridgeHandle { tx }, BridgeInbox { rx })
}

/// Receiving end of the bridge inbox, consumed by
/// [`Bridge::run`](super::Bridge::run).
#[derive(Debug)]
pub struct BridgeInbox {
    rx: mpsc::UnboundedReceiver<BridgeInput>,
}

impl BridgeInbox {
    pub(crate) async fn recv(&mut self) -> Option<BridgeInput> {
        self.rx.recv().await
    }
}

/// Host-facing handle for submitting commands.
#[derive(Debug, Clone)]
pub struct BridgeHandle {
    tx: mpsc::UnboundedSender<BridgeInput>,
}

impl BridgeHandle {
    /// Enqueue `command` and return the receiver for its reply.
    ///
    /// Enqueueing is synchronous, so commands submitted one after another
    /// are dispatched in submission order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Bridge`] if the bridge task has stopped.
    pub fn submit(&self, command: Command) -> Result<oneshot::Receiver<Reply>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(BridgeInput::Command(command, reply_tx))
            .map_err(|_| AppError::Bridge("bridge is not running".into()))?;
        Ok(reply_rx)
    }

    /// Submit `command` and wait for its reply.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Bridge`] if the bridge stops before replying.
    pub async fn dispatch(&self, command: Command) -> Result<Reply> {
        let reply = self.submit(command)?;
        reply
            .await
            .map_err(|_| AppError::Bridge("bridge dropped the command".into()))
    }

    /// Copy of the current bridge state.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Bridge`] if the bridge task has stopped.
    pub async fn snapshot(&self) -> Result<BridgeSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(BridgeInput::Snapshot(tx))
            .map_err(|_| AppError::Bridge("bridge is not running".into()))?;
        rx.await
            .map_err(|_| AppError::Bridge("bridge dropped the snapshot request".into()))
    }

    /// Sink through which SDK callbacks reach this bridge.
    #[must_use]
    pub fn callback_sink(&self) -> CallbackSink {
        CallbackSink {
            tx: self.tx.clone(),
        }
    }
}

/// Delivery point for asynchronous SDK and platform results.
///
/// Safe to call from any thread; delivery never blocks.
#[derive(Debug, Clone)]
pub struct CallbackSink {
    tx: mpsc::UnboundedSender<BridgeInput>,
}

impl CallbackSink {
    /// Queue `callback` behind everything already in the inbox. Callbacks
    /// arriving after the bridge stopped are dropped.
    pub fn deliver(&self, callback: Callback) {
        if let Err(err) = self.tx.send(BridgeInput::Callback(callback)) {
            debug!(callback = ?err.0, "bridge stopped; dropping callback");
        }
    }
}

//! Shared application state handed to the IPC server.

use std::sync::Arc;

use crate::bridge::BridgeHandle;
use crate::config::GlobalConfig;
use crate::relay::EventRelay;

/// Everything a connection handler needs.
pub struct AppState {
    /// Validated configuration.
    pub config: Arc<GlobalConfig>,
    /// Command entry point into the bridge task.
    pub bridge: BridgeHandle,
    /// Topic subscription registry.
    pub relay: Arc<EventRelay>,
}

//! Bridge-internal meeting status listener.
//!
//! Registered with the SDK once initialization succeeds, independent of
//! any host subscription, so the session follows the meeting lifecycle
//! even when nobody listens on the relay.

use crate::sdk::{Callback, NativeEvent, NativeListener};

use super::CallbackSink;

/// Forwards native meeting status changes into the bridge inbox.
#[derive(Debug)]
pub struct SessionTracker {
    callbacks: CallbackSink,
}

impl SessionTracker {
    /// Tracker reporting through `callbacks`.
    #[must_use]
    pub fn new(callbacks: CallbackSink) -> Self {
        Self { callbacks }
    }
}

impl NativeListener for SessionTracker {
    fn on_event(&self, event: &NativeEvent) {
        if let NativeEvent::MeetingStatusChanged { status, code } = *event {
            self.callbacks
                .deliver(Callback::MeetingStatusChanged { status, code });
        }
    }
}

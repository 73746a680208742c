//! Native listeners that translate SDK events into [`StatusEvent`]s.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{trace, warn};

use crate::models::status::{StatusEvent, Topic};
use crate::sdk::{MeetingSdk, NativeEvent, NativeListener};

/// Events buffered per subscription before new ones are dropped.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

/// Replaceable delivery target shared between a listener and the relay.
///
/// Once deactivated the slot drops every event, even one the SDK was
/// already delivering when the subscription ended. SDK callbacks cannot
/// wait, so a full queue drops the newest event with a warning.
#[derive(Debug)]
pub struct SinkSlot {
    active: AtomicBool,
    sink: Mutex<Option<mpsc::Sender<StatusEvent>>>,
}

impl SinkSlot {
    /// Active slot delivering into `sink`.
    #[must_use]
    pub fn new(sink: mpsc::Sender<StatusEvent>) -> Self {
        Self {
            active: AtomicBool::new(true),
            sink: Mutex::new(Some(sink)),
        }
    }

    /// Whether events are being delivered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Point the slot at a new sink. The previous receiver sees its stream end.
    pub fn replace(&self, sink: mpsc::Sender<StatusEvent>) {
        *self.sink.lock().unwrap_or_else(PoisonError::into_inner) = Some(sink);
        self.active.store(true, Ordering::Release);
    }

    /// Stop delivering and close the current stream.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    fn emit(&self, event: StatusEvent) {
        if !self.is_active() {
            trace!(topic = %event.topic, "subscription inactive; dropping event");
            return;
        }
        let sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sink) = sink.as_ref() else {
            return;
        };
        match sink.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(topic = %event.topic, "subscriber lagging; dropping event");
            }
            Err(TrySendError::Closed(_)) => trace!("subscriber gone; dropping event"),
        }
    }
}

/// Forwards every meeting status change by name.
#[derive(Debug)]
pub struct SessionStatusListener {
    slot: Arc<SinkSlot>,
}

impl SessionStatusListener {
    /// Listener delivering into `slot`.
    #[must_use]
    pub fn new(slot: Arc<SinkSlot>) -> Self {
        Self { slot }
    }
}

impl NativeListener for SessionStatusListener {
    fn on_event(&self, event: &NativeEvent) {
        if let NativeEvent::MeetingStatusChanged { status, .. } = *event {
            self.slot.emit(StatusEvent::meeting_status(status));
        }
    }
}

/// Forwards audio changes of the local user only, by ordinal.
pub struct DeviceAudioListener {
    slot: Arc<SinkSlot>,
    sdk: Weak<dyn MeetingSdk>,
}

impl DeviceAudioListener {
    /// Listener delivering into `slot`, resolving the local user via `sdk`.
    #[must_use]
    pub fn new(slot: Arc<SinkSlot>, sdk: Weak<dyn MeetingSdk>) -> Self {
        Self { slot, sdk }
    }
}

impl NativeListener for DeviceAudioListener {
    fn on_event(&self, event: &NativeEvent) {
        let NativeEvent::UserAudioStatusChanged { user_id, status } = *event else {
            return;
        };
        let local = self.sdk.upgrade().and_then(|sdk| sdk.my_user_id());
        if local == Some(user_id) {
            self.slot.emit(StatusEvent::device_audio(status));
        } else {
            trace!(user_id, "audio change for another participant; ignoring");
        }
    }
}

/// Listener for `topic` delivering into `slot`.
#[must_use]
pub fn for_topic(
    topic: Topic,
    slot: Arc<SinkSlot>,
    sdk: Weak<dyn MeetingSdk>,
) -> Arc<dyn NativeListener> {
    match topic {
        Topic::MeetingStatus => Arc::new(SessionStatusListener::new(slot)),
        Topic::DeviceAudio => Arc::new(DeviceAudioListener::new(slot, sdk)),
    }
}

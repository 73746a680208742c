//! Event relay: fans SDK status changes out to host subscribers.
//!
//! One subscription per [`Topic`]. The relay never touches bridge state;
//! the bridge follows the meeting lifecycle through its own tracker.
//!
//! Each stream buffers at most [`EVENT_QUEUE_CAPACITY`] events. A
//! subscriber that stops reading loses later events rather than stalling
//! the SDK's callback thread.

pub mod listeners;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use crate::models::status::{StatusEvent, Topic};
use crate::sdk::{MeetingSdk, NativeListener};

pub use self::listeners::EVENT_QUEUE_CAPACITY;
use self::listeners::SinkSlot;

/// Receiving end of one subscription.
#[derive(Debug)]
pub struct EventStream {
    topic: Topic,
    generation: u64,
    receiver: mpsc::Receiver<StatusEvent>,
}

impl EventStream {
    /// Topic this stream carries.
    #[must_use]
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Next event, or `None` once the subscription has ended.
    pub async fn recv(&mut self) -> Option<StatusEvent> {
        self.receiver.recv().await
    }

    /// Next already-delivered event, without waiting.
    pub fn try_recv(&mut self) -> Option<StatusEvent> {
        self.receiver.try_recv().ok()
    }
}

struct Subscription {
    slot: Arc<SinkSlot>,
    listener: Arc<dyn NativeListener>,
    generation: u64,
}

/// Per-topic subscription registry.
pub struct EventRelay {
    sdk: Arc<dyn MeetingSdk>,
    subscriptions: Mutex<HashMap<Topic, Subscription>>,
    generations: AtomicU64,
}

impl EventRelay {
    /// Relay registering its listeners with `sdk`.
    #[must_use]
    pub fn new(sdk: Arc<dyn MeetingSdk>) -> Self {
        Self {
            sdk,
            subscriptions: Mutex::new(HashMap::new()),
            generations: AtomicU64::new(0),
        }
    }

    /// Subscribe to `topic`.
    ///
    /// A second subscription to the same topic takes over the existing
    /// native listener; the earlier stream ends and no second listener is
    /// registered with the SDK.
    pub async fn subscribe(&self, topic: Topic) -> EventStream {
        let (tx, receiver) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;

        let mut subscriptions = self.subscriptions.lock().await;
        if let Some(existing) = subscriptions.get_mut(&topic) {
            debug!(%topic, generation, "re-pointing existing subscription");
            existing.slot.replace(tx);
            existing.generation = generation;
        } else {
            let slot = Arc::new(SinkSlot::new(tx));
            let listener =
                listeners::for_topic(topic, Arc::clone(&slot), Arc::downgrade(&self.sdk));
            self.sdk.add_listener(topic, Arc::clone(&listener));
            subscriptions.insert(
                topic,
                Subscription {
                    slot,
                    listener,
                    generation,
                },
            );
            info!(%topic, "subscribed");
        }

        EventStream {
            topic,
            generation,
            receiver,
        }
    }

    /// End the subscription to `topic`. Returns whether one existed.
    pub async fn unsubscribe(&self, topic: Topic) -> bool {
        let removed = self.subscriptions.lock().await.remove(&topic);
        removed.is_some_and(|subscription| {
            self.release(topic, &subscription);
            true
        })
    }

    /// End the subscription `stream` belongs to, unless a newer subscriber
    /// has taken the topic over since.
    pub async fn cancel(&self, stream: &EventStream) -> bool {
        let mut subscriptions = self.subscriptions.lock().await;
        let current = subscriptions
            .get(&stream.topic)
            .is_some_and(|subscription| subscription.generation == stream.generation);
        if !current {
            debug!(topic = %stream.topic, "stale stream cancelled; subscription kept");
            return false;
        }
        subscriptions
            .remove(&stream.topic)
            .is_some_and(|subscription| {
                self.release(stream.topic, &subscription);
                true
            })
    }

    /// Whether `topic` has a live subscription.
    pub async fn is_subscribed(&self, topic: Topic) -> bool {
        self.subscriptions
            .lock()
            .await
            .get(&topic)
            .is_some_and(|subscription| subscription.slot.is_active())
    }

    /// End every subscription.
    pub async fn shutdown(&self) {
        let drained: Vec<_> = self.subscriptions.lock().await.drain().collect();
        for (topic, subscription) in &drained {
            self.release(*topic, subscription);
        }
        debug!(count = drained.len(), "relay shut down");
    }

    fn release(&self, topic: Topic, subscription: &Subscription) {
        subscription.slot.deactivate();
        self.sdk.remove_listener(topic, &subscription.listener);
        info!(%topic, "unsubscribed");
    }
}

//! Unit tests for the event relay and its native listeners.

use std::sync::Arc;

use meeting_bridge::bridge;
use meeting_bridge::config::SimulatorConfig;
use meeting_bridge::models::status::{AudioStatus, EventPayload, MeetingStatus, StatusEvent, Topic};
use meeting_bridge::relay::listeners::{self, SinkSlot};
use meeting_bridge::relay::{EventRelay, EVENT_QUEUE_CAPACITY};
use meeting_bridge::sdk::simulated::SimulatedSdk;
use meeting_bridge::sdk::{MeetingSdk, NativeEvent};
use tokio::sync::mpsc;

const LOCAL_USER: u64 = 77;

fn relay() -> (Arc<SimulatedSdk>, EventRelay) {
    let (handle, _inbox) = bridge::channel();
    let config = SimulatorConfig {
        local_user_id: LOCAL_USER,
        auto_respond: false,
        ..SimulatorConfig::default()
    };
    let sdk = Arc::new(SimulatedSdk::new(config, handle.callback_sink()));
    let shared: Arc<dyn MeetingSdk> = sdk.clone();
    (sdk, EventRelay::new(shared))
}

#[tokio::test]
async fn status_events_arrive_by_name() {
    let (sdk, relay) = relay();
    let mut stream = relay.subscribe(Topic::MeetingStatus).await;
    assert_eq!(stream.topic(), Topic::MeetingStatus);

    sdk.set_status(MeetingStatus::Connecting);
    sdk.set_status(MeetingStatus::InMeeting);

    assert_eq!(
        stream.recv().await,
        Some(StatusEvent::meeting_status(MeetingStatus::Connecting))
    );
    let event = stream.recv().await.expect("second event");
    assert_eq!(
        event.payload,
        EventPayload::Status("MEETING_STATUS_INMEETING".into())
    );
}

#[tokio::test]
async fn device_audio_only_forwards_local_user() {
    let (sdk, relay) = relay();
    let mut stream = relay.subscribe(Topic::DeviceAudio).await;

    sdk.audio_event(LOCAL_USER + 1, AudioStatus::Muted);
    sdk.audio_event(LOCAL_USER, AudioStatus::UnMuted);

    let event = stream.recv().await.expect("local event");
    assert_eq!(event.topic, Topic::DeviceAudio);
    assert_eq!(event.payload, EventPayload::Ordinal(2));
    assert!(stream.try_recv().is_none());
}

#[tokio::test]
async fn topics_are_independent() {
    let (sdk, relay) = relay();
    let mut audio = relay.subscribe(Topic::DeviceAudio).await;

    sdk.set_status(MeetingStatus::InMeeting);
    assert!(audio.try_recv().is_none());
    assert!(!relay.is_subscribed(Topic::MeetingStatus).await);
    assert!(relay.is_subscribed(Topic::DeviceAudio).await);
}

#[tokio::test]
async fn resubscribe_reuses_native_listener() {
    let (sdk, relay) = relay();
    let mut first = relay.subscribe(Topic::MeetingStatus).await;
    let mut second = relay.subscribe(Topic::MeetingStatus).await;

    assert_eq!(sdk.listener_count(Topic::MeetingStatus), 1);

    // The replaced stream ends without further events.
    assert_eq!(first.recv().await, None);

    sdk.set_status(MeetingStatus::Connecting);
    assert_eq!(
        second.recv().await,
        Some(StatusEvent::meeting_status(MeetingStatus::Connecting))
    );
}

#[tokio::test]
async fn stale_cancel_keeps_newer_subscription() {
    let (sdk, relay) = relay();
    let first = relay.subscribe(Topic::MeetingStatus).await;
    let mut second = relay.subscribe(Topic::MeetingStatus).await;

    assert!(!relay.cancel(&first).await);
    assert!(relay.is_subscribed(Topic::MeetingStatus).await);

    sdk.set_status(MeetingStatus::Idle);
    assert!(second.recv().await.is_some());
}

#[tokio::test]
async fn cancel_ends_stream_and_unregisters() {
    let (sdk, relay) = relay();
    let mut stream = relay.subscribe(Topic::DeviceAudio).await;
    assert_eq!(sdk.listener_count(Topic::DeviceAudio), 1);

    assert!(relay.cancel(&stream).await);
    assert_eq!(sdk.listener_count(Topic::DeviceAudio), 0);
    assert!(!relay.is_subscribed(Topic::DeviceAudio).await);

    sdk.audio_event(LOCAL_USER, AudioStatus::Muted);
    assert_eq!(stream.recv().await, None);
}

#[tokio::test]
async fn unsubscribe_without_subscription_is_noop() {
    let (sdk, relay) = relay();
    assert!(!relay.unsubscribe(Topic::MeetingStatus).await);

    let mut stream = relay.subscribe(Topic::MeetingStatus).await;
    assert!(relay.unsubscribe(Topic::MeetingStatus).await);
    assert!(!relay.unsubscribe(Topic::MeetingStatus).await);
    assert_eq!(sdk.listener_count(Topic::MeetingStatus), 0);
    assert_eq!(stream.recv().await, None);
}

#[tokio::test]
async fn subscribe_after_unsubscribe_registers_again() {
    let (sdk, relay) = relay();
    let stream = relay.subscribe(Topic::MeetingStatus).await;
    assert!(relay.cancel(&stream).await);

    let mut again = relay.subscribe(Topic::MeetingStatus).await;
    assert_eq!(sdk.listener_count(Topic::MeetingStatus), 1);

    sdk.set_status(MeetingStatus::Ended);
    assert_eq!(
        again.recv().await,
        Some(StatusEvent::meeting_status(MeetingStatus::Ended))
    );
}

#[tokio::test]
async fn shutdown_ends_every_subscription() {
    let (sdk, relay) = relay();
    let mut status = relay.subscribe(Topic::MeetingStatus).await;
    let mut audio = relay.subscribe(Topic::DeviceAudio).await;

    relay.shutdown().await;

    assert_eq!(sdk.listener_count(Topic::MeetingStatus), 0);
    assert_eq!(sdk.listener_count(Topic::DeviceAudio), 0);
    assert_eq!(status.recv().await, None);
    assert_eq!(audio.recv().await, None);
}

#[test]
fn deactivated_listener_emits_nothing() {
    let (sdk, _relay) = relay();
    let shared: Arc<dyn MeetingSdk> = sdk;
    let (tx, mut rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
    let slot = Arc::new(SinkSlot::new(tx));

    let status = listeners::for_topic(
        Topic::MeetingStatus,
        Arc::clone(&slot),
        Arc::downgrade(&shared),
    );
    let audio = listeners::for_topic(
        Topic::DeviceAudio,
        Arc::clone(&slot),
        Arc::downgrade(&shared),
    );
    let local_mute = NativeEvent::UserAudioStatusChanged {
        user_id: LOCAL_USER,
        status: AudioStatus::Muted,
    };

    status.on_event(&NativeEvent::MeetingStatusChanged {
        status: MeetingStatus::Connecting,
        code: 0,
    });
    audio.on_event(&local_mute);
    assert_eq!(
        rx.try_recv().ok(),
        Some(StatusEvent::meeting_status(MeetingStatus::Connecting))
    );
    assert_eq!(
        rx.try_recv().ok(),
        Some(StatusEvent::device_audio(AudioStatus::Muted))
    );

    slot.deactivate();
    assert!(!slot.is_active());

    // Events already in flight from the SDK when the subscription ended.
    status.on_event(&NativeEvent::MeetingStatusChanged {
        status: MeetingStatus::InMeeting,
        code: 0,
    });
    audio.on_event(&local_mute);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn lagging_subscriber_keeps_oldest_events() {
    let (sdk, relay) = relay();
    let mut stream = relay.subscribe(Topic::MeetingStatus).await;

    for _ in 0..EVENT_QUEUE_CAPACITY {
        sdk.set_status(MeetingStatus::Connecting);
    }
    sdk.set_status(MeetingStatus::InMeeting);

    let received: Vec<_> = std::iter::from_fn(|| stream.try_recv()).collect();
    assert_eq!(received.len(), EVENT_QUEUE_CAPACITY);
    assert!(received
        .iter()
        .all(|event| *event == StatusEvent::meeting_status(MeetingStatus::Connecting)));

    // Delivery resumes once the subscriber catches up.
    sdk.set_status(MeetingStatus::Ended);
    assert_eq!(
        stream.recv().await,
        Some(StatusEvent::meeting_status(MeetingStatus::Ended))
    );
    assert!(relay.is_subscribed(Topic::MeetingStatus).await);
}

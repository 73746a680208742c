//! Unit tests for the simulated SDK and permission gate.

use std::sync::Arc;

use meeting_bridge::bridge;
use meeting_bridge::config::SimulatorConfig;
use meeting_bridge::models::options::MeetingOptions;
use meeting_bridge::models::status::MeetingStatus;
use meeting_bridge::sdk::simulated::{
    MeetingSettings, SdkCall, SimulatedPermissions, SimulatedSdk, INVALID_MEETING_NUMBER,
};
use meeting_bridge::sdk::{InitParams, MeetingSdk, PermissionGate, PermissionStatus};
use meeting_bridge::AppError;

fn init_params() -> InitParams {
    InitParams {
        app_key: Some("key".into()),
        app_secret: Some("secret".into()),
        jwt_token: None,
        domain: "zoom.us".into(),
        enable_log: false,
    }
}

fn join_options(number: &str) -> MeetingOptions {
    MeetingOptions {
        meeting_id: Some(number.into()),
        meeting_password: Some("pw".into()),
        ..MeetingOptions::default()
    }
}

fn manual() -> SimulatorConfig {
    SimulatorConfig {
        auto_respond: false,
        ..SimulatorConfig::default()
    }
}

#[test]
fn status_unavailable_until_initialized() {
    let (handle, _inbox) = bridge::channel();
    let sdk = SimulatedSdk::new(manual(), handle.callback_sink());

    assert_eq!(sdk.meeting_status(), None);
    sdk.initialize(&init_params()).expect("initialize");
    assert_eq!(sdk.meeting_status(), None);

    sdk.complete_initialize(0);
    assert_eq!(sdk.meeting_status(), Some(MeetingStatus::Idle));
}

#[test]
fn failed_initialize_stays_uninitialized() {
    let (handle, _inbox) = bridge::channel();
    let sdk = SimulatedSdk::new(manual(), handle.callback_sink());
    sdk.complete_initialize(3);
    assert_eq!(sdk.meeting_status(), None);
}

#[test]
fn records_calls_in_order() {
    let (handle, _inbox) = bridge::channel();
    let sdk = SimulatedSdk::new(manual(), handle.callback_sink());

    sdk.initialize(&init_params()).expect("initialize");
    sdk.join_meeting(&join_options("123")).expect("join");
    sdk.mute_my_audio(true).expect("mute");

    assert_eq!(
        sdk.calls(),
        vec![
            SdkCall::Initialize,
            SdkCall::JoinMeeting("123".into(), MeetingSettings::default()),
            SdkCall::MuteMyAudio(true),
        ]
    );
    assert!(sdk.is_my_audio_muted());
    assert_eq!(sdk.call_count(&SdkCall::Initialize), 1);
}

#[test]
fn join_without_number_is_rejected() {
    let (handle, _inbox) = bridge::channel();
    let sdk = SimulatedSdk::new(manual(), handle.callback_sink());

    let err = sdk.join_meeting(&MeetingOptions::default()).unwrap_err();
    assert!(matches!(err, AppError::Sdk(code) if code == INVALID_MEETING_NUMBER));
    assert_eq!(sdk.meeting_credentials(), None);
}

#[test]
fn injected_meeting_failure_applies_once() {
    let (handle, _inbox) = bridge::channel();
    let sdk = SimulatedSdk::new(manual(), handle.callback_sink());

    sdk.fail_next_meeting(9);
    let err = sdk.start_meeting("555", &MeetingOptions::default()).unwrap_err();
    assert!(matches!(err, AppError::Sdk(9)));

    sdk.start_meeting("555", &MeetingOptions::default())
        .expect("second attempt succeeds");
    assert_eq!(
        sdk.meeting_credentials(),
        Some(("555".to_owned(), String::new()))
    );
}

#[test]
fn instant_meeting_gets_generated_number() {
    let (handle, _inbox) = bridge::channel();
    let sdk = SimulatedSdk::new(manual(), handle.callback_sink());

    sdk.start_instant_meeting(&MeetingOptions::default())
        .expect("start");
    let (number, password) = sdk.meeting_credentials().expect("meeting");
    assert_eq!(number.len(), 10);
    assert_eq!(password.len(), 6);
}

#[test]
fn auto_respond_walks_meeting_lifecycle() {
    let (handle, _inbox) = bridge::channel();
    let sdk = SimulatedSdk::new(SimulatorConfig::default(), handle.callback_sink());

    sdk.initialize(&init_params()).expect("initialize");
    sdk.join_meeting(&join_options("42")).expect("join");
    assert_eq!(sdk.meeting_status(), Some(MeetingStatus::InMeeting));
    assert!(sdk.show_meeting_ui());

    sdk.leave_meeting();
    assert_eq!(sdk.meeting_status(), Some(MeetingStatus::Idle));
    assert_eq!(sdk.meeting_credentials(), None);
    assert!(!sdk.hide_meeting_ui());
}

#[test]
fn connect_audio_marks_audio_connected() {
    let (handle, _inbox) = bridge::channel();
    let sdk = SimulatedSdk::new(manual(), handle.callback_sink());

    assert!(!sdk.is_audio_connected());
    sdk.connect_audio().expect("connect");
    assert!(sdk.is_audio_connected());

    sdk.set_status(MeetingStatus::Ended);
    assert!(!sdk.is_audio_connected());
}

#[test]
fn local_user_comes_from_config() {
    let (handle, _inbox) = bridge::channel();
    let config = SimulatorConfig {
        local_user_id: 5,
        ..manual()
    };
    let sdk: Arc<dyn MeetingSdk> = Arc::new(SimulatedSdk::new(config, handle.callback_sink()));
    assert_eq!(sdk.my_user_id(), Some(5));
}

#[test]
fn permissions_follow_config_and_answers() {
    let (handle, _inbox) = bridge::channel();
    let config = SimulatorConfig {
        microphone_granted: false,
        ..manual()
    };
    let gate = SimulatedPermissions::new(&config, handle.callback_sink());

    assert_eq!(gate.check_microphone(), PermissionStatus::Denied);
    gate.request_microphone();
    assert_eq!(gate.request_count(), 1);
    assert_eq!(gate.check_microphone(), PermissionStatus::Denied);

    gate.answer(true);
    assert_eq!(gate.check_microphone(), PermissionStatus::Granted);
}

#[test]
fn auto_respond_grants_on_request() {
    let (handle, _inbox) = bridge::channel();
    let config = SimulatorConfig {
        microphone_granted: false,
        grant_on_request: true,
        ..SimulatorConfig::default()
    };
    let gate = SimulatedPermissions::new(&config, handle.callback_sink());

    gate.request_microphone();
    assert_eq!(gate.check_microphone(), PermissionStatus::Granted);
}

//! Authentication-then-action chains driven through the bridge.

use meeting_bridge::bridge::workflow::ChainStage;
use meeting_bridge::models::command::Command;
use meeting_bridge::models::reply::Reply;
use meeting_bridge::models::session::AuthState;
use meeting_bridge::models::status::Topic;
use meeting_bridge::sdk::simulated::{MeetingSettings, SdkCall};

use super::test_helpers::{init_command, simulator, Harness};

#[tokio::test]
async fn init_twice_reports_success_without_reinitializing() {
    let harness = Harness::start(simulator(false));
    harness.initialize().await;

    let again = harness.dispatch(init_command()).await;
    assert_eq!(again, Reply::Codes(0, 0));
    assert_eq!(harness.sdk.call_count(&SdkCall::Initialize), 1);

    harness.shutdown().await;
}

#[tokio::test]
async fn init_parks_until_callback() {
    let harness = Harness::start(simulator(false));
    let mut reply = harness.submit(init_command());

    let snapshot = harness.snapshot().await;
    assert_eq!(snapshot.pending.as_deref(), Some("init"));
    assert_eq!(snapshot.chain, ChainStage::AwaitingInit);
    assert!(reply.try_recv().is_err());

    harness.sdk.complete_initialize(0);
    assert_eq!(reply.await.unwrap(), Reply::Codes(0, 0));

    let snapshot = harness.snapshot().await;
    assert!(snapshot.session.initialized);
    assert_eq!(snapshot.pending, None);
    assert_eq!(snapshot.chain, ChainStage::Idle);

    harness.shutdown().await;
}

#[tokio::test]
async fn failed_init_returns_codes_and_stays_uninitialized() {
    let harness = Harness::start(simulator(false));
    let reply = harness.submit(init_command());
    harness.sdk.complete_initialize(3);

    assert_eq!(reply.await.unwrap(), Reply::Codes(3, 0));
    let snapshot = harness.snapshot().await;
    assert!(!snapshot.session.initialized);
    assert_eq!(harness.sdk.listener_count(Topic::MeetingStatus), 0);

    harness.shutdown().await;
}

#[tokio::test]
async fn init_without_credentials_is_rejected_up_front() {
    let harness = Harness::start(simulator(false));

    let reply = harness.dispatch(Command::new("init")).await;
    assert_eq!(reply, Reply::Codes(1, 0));
    assert_eq!(harness.sdk.call_count(&SdkCall::Initialize), 0);

    harness.shutdown().await;
}

#[tokio::test]
async fn init_accepts_token_instead_of_key_pair() {
    let harness = Harness::start(simulator(true));

    let reply = harness
        .dispatch(Command::new("init").with_arg("jwtToken", "signed"))
        .await;
    assert_eq!(reply, Reply::Codes(0, 0));

    harness.shutdown().await;
}

#[tokio::test]
async fn login_failure_reports_code_and_resets_auth() {
    let harness = Harness::start(simulator(false));
    harness.initialize().await;

    let reply = harness.submit(Command::new("login").with_arg("userId", "alice"));
    let snapshot = harness.snapshot().await;
    assert_eq!(snapshot.session.auth, AuthState::Authenticating);
    assert_eq!(snapshot.chain, ChainStage::AwaitingAuth);

    harness.sdk.complete_authentication(5);
    assert_eq!(reply.await.unwrap(), Reply::pair("LOGIN ERROR", "5"));

    let snapshot = harness.snapshot().await;
    assert_eq!(snapshot.session.auth, AuthState::Unauthenticated);
    assert_eq!(snapshot.session.last_auth_error, Some(5));
    let instant = SdkCall::StartInstantMeeting(MeetingSettings::default());
    assert_eq!(harness.sdk.call_count(&instant), 0);

    harness.shutdown().await;
}

#[tokio::test]
async fn login_success_starts_instant_meeting() {
    let harness = Harness::start(simulator(false));
    harness.initialize().await;

    let reply = harness.submit(Command::new("login"));
    harness.drain().await;
    harness.sdk.complete_authentication(0);

    assert_eq!(reply.await.unwrap(), Reply::meeting_success());
    let instant = SdkCall::StartInstantMeeting(MeetingSettings::default());
    assert_eq!(harness.sdk.call_count(&instant), 1);
    assert_eq!(harness.snapshot().await.session.auth, AuthState::Authenticated);

    harness.shutdown().await;
}

#[tokio::test]
async fn start_normal_authenticates_then_starts() {
    let harness = Harness::start(simulator(false));
    harness.initialize().await;

    let reply = harness.submit(Command::new("start_normal").with_arg("meetingId", "123456"));
    harness.drain().await;
    assert!(harness.sdk.calls().contains(&SdkCall::Authenticate));
    let start = SdkCall::StartMeeting("123456".into(), MeetingSettings::default());
    assert_eq!(harness.sdk.call_count(&start), 0);

    harness.sdk.complete_authentication(0);
    assert_eq!(reply.await.unwrap(), Reply::pair("MEETING SUCCESS", "200"));
    assert_eq!(harness.sdk.call_count(&start), 1);

    harness.shutdown().await;
}

#[tokio::test]
async fn authenticated_login_skips_auth_and_parking() {
    let harness = Harness::start(simulator(true));
    harness.dispatch(init_command()).await;
    assert_eq!(harness.dispatch(Command::new("login")).await, Reply::meeting_success());

    // Authenticated now; the second start runs without another auth call.
    harness.dispatch(Command::new("leave_meeting")).await;
    let reply = harness
        .dispatch(Command::new("startNormal").with_arg("meetingId", "987"))
        .await;
    assert_eq!(reply, Reply::meeting_success());
    assert_eq!(harness.sdk.call_count(&SdkCall::Authenticate), 1);

    harness.shutdown().await;
}

#[tokio::test]
async fn rejected_meeting_request_reports_error_code() {
    let harness = Harness::start(simulator(true));
    harness.dispatch(init_command()).await;

    harness.sdk.fail_next_meeting(9);
    let reply = harness.dispatch(Command::new("login")).await;
    assert_eq!(reply, Reply::pair("MEETING ERROR", "9"));

    let snapshot = harness.snapshot().await;
    assert_eq!(snapshot.pending, None);
    assert_eq!(snapshot.chain, ChainStage::Idle);

    harness.shutdown().await;
}

#[tokio::test]
async fn start_normal_requires_meeting_id() {
    let harness = Harness::start(simulator(true));
    harness.dispatch(init_command()).await;

    let reply = harness.dispatch(Command::new("start_normal")).await;
    assert_eq!(reply, Reply::pair("MEETING ERROR", "meetingId required"));
    assert_eq!(harness.sdk.call_count(&SdkCall::Authenticate), 0);

    harness.shutdown().await;
}

#[tokio::test]
async fn second_mutating_command_is_rejected_while_parked() {
    let harness = Harness::start(simulator(false));
    harness.initialize().await;

    let first = harness.submit(Command::new("login"));
    let second = harness.dispatch(Command::new("login")).await;
    assert_eq!(second, Reply::pair("ALREADY PENDING", "login"));

    let join = harness
        .dispatch(Command::new("join").with_arg("meetingId", "1"))
        .await;
    assert_eq!(join, Reply::already_pending("login"));
    assert_eq!(harness.sdk.call_count(&SdkCall::Authenticate), 1);

    harness.sdk.complete_authentication(0);
    assert_eq!(first.await.unwrap(), Reply::meeting_success());

    harness.shutdown().await;
}

#[tokio::test]
async fn late_duplicate_callback_is_ignored() {
    let harness = Harness::start(simulator(false));
    harness.initialize().await;

    harness.sdk.complete_initialize(0);
    harness.sdk.complete_authentication(0);
    let snapshot = harness.snapshot().await;
    assert_eq!(snapshot.pending, None);
    assert_eq!(snapshot.chain, ChainStage::Idle);

    harness.shutdown().await;
}

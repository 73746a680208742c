//! Unit tests for reply constructors and wire shape.

use meeting_bridge::models::reply::Reply;
use serde_json::json;

#[test]
fn canonical_pairs() {
    assert_eq!(Reply::sdk_error(), Reply::pair("SDK ERROR", "001"));
    assert_eq!(Reply::login_error(1002), Reply::pair("LOGIN ERROR", "1002"));
    assert_eq!(Reply::login_required(), Reply::pair("LOGIN REQUIRED", "001"));
    assert_eq!(
        Reply::meeting_success(),
        Reply::pair("MEETING SUCCESS", "200")
    );
    assert_eq!(Reply::meeting_error(4), Reply::pair("MEETING ERROR", "4"));
    assert_eq!(
        Reply::status_unknown("SDK not initialized"),
        Reply::pair("MEETING_STATUS_UNKNOWN", "SDK not initialized")
    );
    assert_eq!(
        Reply::already_pending("login"),
        Reply::pair("ALREADY PENDING", "login")
    );
}

#[test]
fn replies_serialize_as_plain_values() {
    assert_eq!(serde_json::to_value(Reply::Codes(0, 0)).unwrap(), json!([0, 0]));
    assert_eq!(serde_json::to_value(Reply::Flag(true)).unwrap(), json!(true));
    assert_eq!(
        serde_json::to_value(Reply::meeting_success()).unwrap(),
        json!(["MEETING SUCCESS", "200"])
    );
    assert_eq!(serde_json::to_value(Reply::Empty).unwrap(), json!(null));
}

#[test]
fn success_classification() {
    assert!(Reply::Codes(0, 3).is_success());
    assert!(!Reply::Codes(1, 0).is_success());
    assert!(Reply::Flag(true).is_success());
    assert!(!Reply::Flag(false).is_success());
    assert!(Reply::meeting_success().is_success());
    assert!(!Reply::sdk_error().is_success());
    assert!(!Reply::login_error(1).is_success());
    assert!(!Reply::already_pending("init").is_success());
    assert!(Reply::pair("MEETING_STATUS_INMEETING", "").is_success());
}

//! Unit tests for configuration parsing and validation.

use std::io::Write;

use meeting_bridge::bridge::BridgeSettings;
use meeting_bridge::config::GlobalConfig;
use meeting_bridge::AppError;

const SAMPLE: &str = r#"
ipc_name = "bridge-test"

[sdk]
domain = "example.zoom.us"
enable_log = false

[timeouts]
command_seconds = 30

[simulator]
init_error_code = 3
auth_result_code = 1002
local_user_id = 42
microphone_granted = false
grant_on_request = false
auto_respond = false
"#;

#[test]
fn parses_full_config() {
    let config = GlobalConfig::from_toml_str(SAMPLE).expect("config parses");
    assert_eq!(config.ipc_name, "bridge-test");
    assert_eq!(config.sdk.domain, "example.zoom.us");
    assert!(!config.sdk.enable_log);
    assert_eq!(config.timeouts.command_seconds, 30);
    assert_eq!(config.simulator.init_error_code, 3);
    assert_eq!(config.simulator.auth_result_code, 1002);
    assert_eq!(config.simulator.local_user_id, 42);
    assert!(!config.simulator.microphone_granted);
    assert!(!config.simulator.grant_on_request);
    assert!(!config.simulator.auto_respond);
}

#[test]
fn empty_document_yields_defaults() {
    let config = GlobalConfig::from_toml_str("").expect("defaults");
    assert_eq!(config, GlobalConfig::default());
    assert_eq!(config.ipc_name, "meeting-bridge");
    assert_eq!(config.sdk.domain, "zoom.us");
    assert!(config.sdk.enable_log);
    assert_eq!(config.timeouts.command_seconds, 120);
    assert_eq!(config.simulator.local_user_id, 16_778_240);
    assert!(config.simulator.auto_respond);
}

#[test]
fn credentials_are_never_read_from_toml() {
    let raw = r#"
[sdk]
app_key = "from-file"
app_secret = "from-file"
"#;
    let config = GlobalConfig::from_toml_str(raw).expect("config parses");
    assert_eq!(config.sdk.app_key, None);
    assert_eq!(config.sdk.app_secret, None);
}

#[test]
fn empty_ipc_name_is_rejected() {
    let err = GlobalConfig::from_toml_str("ipc_name = \"  \"").unwrap_err();
    assert!(matches!(err, AppError::Config(ref msg) if msg.contains("ipc_name")));
}

#[test]
fn empty_domain_is_rejected() {
    let err = GlobalConfig::from_toml_str("[sdk]\ndomain = \"\"").unwrap_err();
    assert!(matches!(err, AppError::Config(ref msg) if msg.contains("domain")));
}

#[test]
fn zero_command_timeout_is_rejected() {
    let err = GlobalConfig::from_toml_str("[timeouts]\ncommand_seconds = 0").unwrap_err();
    assert!(matches!(err, AppError::Config(ref msg) if msg.contains("command_seconds")));
}

#[test]
fn malformed_toml_is_config_error() {
    let err = GlobalConfig::from_toml_str("ipc_name = ").unwrap_err();
    assert!(err.to_string().starts_with("config: invalid config"));
}

#[test]
fn loads_from_path() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    file.write_all(SAMPLE.as_bytes()).expect("write");

    let config = GlobalConfig::load_from_path(file.path()).expect("load");
    assert_eq!(config.ipc_name, "bridge-test");
}

#[test]
fn missing_file_is_config_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = GlobalConfig::load_from_path(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, AppError::Config(ref msg) if msg.contains("failed to read config")));
}

#[test]
fn bridge_settings_follow_config() {
    let mut config = GlobalConfig::from_toml_str(SAMPLE).expect("config parses");
    config.sdk.app_key = Some("key".into());

    let settings = BridgeSettings::from(&config);
    assert_eq!(settings.domain, "example.zoom.us");
    assert!(!settings.enable_log);
    assert_eq!(settings.app_key.as_deref(), Some("key"));
    assert_eq!(settings.app_secret, None);
}

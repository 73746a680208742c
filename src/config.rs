//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::{AppError, Result};

/// Keyring service holding the SDK application credentials.
pub const KEYRING_SERVICE: &str = "meeting-bridge";

/// Environment variable fallback for the application key.
pub const APP_KEY_ENV: &str = "MEETING_BRIDGE_APP_KEY";

/// Environment variable fallback for the application secret.
pub const APP_SECRET_ENV: &str = "MEETING_BRIDGE_APP_SECRET";

/// Meeting SDK settings.
///
/// The application key and secret are loaded at runtime from the OS
/// keychain or environment variables, never from the TOML file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SdkConfig {
    /// Web domain passed to SDK initialization.
    #[serde(default = "default_domain")]
    pub domain: String,
    /// Whether the SDK writes its own log files.
    #[serde(default = "default_true")]
    pub enable_log: bool,
    /// Application key (populated at runtime).
    #[serde(skip)]
    pub app_key: Option<String>,
    /// Application secret (populated at runtime).
    #[serde(skip)]
    pub app_secret: Option<String>,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            enable_log: true,
            app_key: None,
            app_secret: None,
        }
    }
}

/// Timeout values (seconds) for host-facing requests.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TimeoutConfig {
    /// How long an IPC client waits for a command reply.
    #[serde(default = "default_command_seconds")]
    pub command_seconds: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            command_seconds: default_command_seconds(),
        }
    }
}

/// Behaviour of the simulated SDK used by the development binary.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SimulatorConfig {
    /// Error code reported for initialization.
    #[serde(default)]
    pub init_error_code: i64,
    /// Code reported for authentication.
    #[serde(default)]
    pub auth_result_code: i64,
    /// Participant id of the local user.
    #[serde(default = "default_local_user_id")]
    pub local_user_id: u64,
    /// Whether microphone permission is granted at start.
    #[serde(default = "default_true")]
    pub microphone_granted: bool,
    /// Answer given to a microphone permission request.
    #[serde(default = "default_true")]
    pub grant_on_request: bool,
    /// Deliver callbacks and status events without outside prompting.
    #[serde(default = "default_true")]
    pub auto_respond: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            init_error_code: 0,
            auth_result_code: 0,
            local_user_id: default_local_user_id(),
            microphone_granted: true,
            grant_on_request: true,
            auto_respond: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_domain() -> String {
    "zoom.us".into()
}

fn default_command_seconds() -> u64 {
    120
}

fn default_local_user_id() -> u64 {
    16_778_240
}

fn default_ipc_name() -> String {
    "meeting-bridge".into()
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Named pipe / Unix socket identifier.
    #[serde(default = "default_ipc_name")]
    pub ipc_name: String,
    /// Meeting SDK settings.
    #[serde(default)]
    pub sdk: SdkConfig,
    /// Request timeouts.
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    /// Simulated SDK behaviour.
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            ipc_name: default_ipc_name(),
            sdk: SdkConfig::default(),
            timeouts: TimeoutConfig::default(),
            simulator: SimulatorConfig::default(),
        }
    }
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load SDK credentials from the OS keychain with env-var fallback.
    ///
    /// Tries the `meeting-bridge` keyring service first, then
    /// `MEETING_BRIDGE_APP_KEY` / `MEETING_BRIDGE_APP_SECRET`. Missing
    /// credentials are not an error: `init` can still carry its own key and
    /// secret or a token.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the keychain lookup task fails.
    pub async fn load_credentials(&mut self) -> Result<()> {
        self.sdk.app_key = load_credential("app_key", APP_KEY_ENV).await?;
        self.sdk.app_secret = load_credential("app_secret", APP_SECRET_ENV).await?;

        if self.sdk.app_key.is_some() && self.sdk.app_secret.is_some() {
            info!("sdk credentials loaded");
        } else {
            warn!("sdk credentials incomplete; init must supply its own");
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.ipc_name.trim().is_empty() {
            return Err(AppError::Config("ipc_name must not be empty".into()));
        }

        if self.sdk.domain.trim().is_empty() {
            return Err(AppError::Config("sdk.domain must not be empty".into()));
        }

        if self.timeouts.command_seconds == 0 {
            return Err(AppError::Config(
                "timeouts.command_seconds must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<Option<String>> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(Some(value)),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    Ok(env::var(env_key).ok().filter(|value| !value.is_empty()))
}

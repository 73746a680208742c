//! Structured results returned to command callers.
//!
//! Failures are never thrown across the command channel; every outcome is
//! one of these values, most of them a two-element `(category, detail)`
//! tuple.

use serde::Serialize;

/// Category used when the SDK is not initialized.
pub const SDK_ERROR: &str = "SDK ERROR";
/// Detail code paired with [`SDK_ERROR`] and [`LOGIN_REQUIRED`].
pub const NOT_READY_CODE: &str = "001";
/// Category used when authentication fails.
pub const LOGIN_ERROR: &str = "LOGIN ERROR";
/// Category used when an action needs a logged-in user.
pub const LOGIN_REQUIRED: &str = "LOGIN REQUIRED";
/// Category used when a meeting starts.
pub const MEETING_SUCCESS: &str = "MEETING SUCCESS";
/// Detail code paired with [`MEETING_SUCCESS`].
pub const SUCCESS_CODE: &str = "200";
/// Category used when the SDK rejects a start request.
pub const MEETING_ERROR: &str = "MEETING ERROR";
/// Category used when no meeting status is available.
pub const STATUS_UNKNOWN: &str = "MEETING_STATUS_UNKNOWN";
/// Category used when a session-mutating command is already in flight.
pub const ALREADY_PENDING: &str = "ALREADY PENDING";
/// Category used when an audio operation fails.
pub const AUDIO_ERROR: &str = "AUDIO ERROR";

/// SDK error code for invalid initialization arguments.
pub const INVALID_ARGUMENTS: i64 = 1;

/// Result value delivered to a command caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    /// Numeric `(error, internal)` pair, used by `init`.
    Codes(i64, i64),
    /// Boolean outcome.
    Flag(bool),
    /// `(category, detail)` pair.
    Pair(String, String),
    /// Fire-and-forget acknowledgement.
    Empty,
    /// The command name is not recognized.
    NotImplemented,
}

impl Reply {
    /// `(category, detail)` pair from anything string-like.
    #[must_use]
    pub fn pair(category: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Pair(category.into(), detail.into())
    }

    /// `("SDK ERROR", "001")`.
    #[must_use]
    pub fn sdk_error() -> Self {
        Self::pair(SDK_ERROR, NOT_READY_CODE)
    }

    /// `("LOGIN ERROR", code)`.
    #[must_use]
    pub fn login_error(code: i64) -> Self {
        Self::pair(LOGIN_ERROR, code.to_string())
    }

    /// `("LOGIN REQUIRED", "001")`.
    #[must_use]
    pub fn login_required() -> Self {
        Self::pair(LOGIN_REQUIRED, NOT_READY_CODE)
    }

    /// `("MEETING SUCCESS", "200")`.
    #[must_use]
    pub fn meeting_success() -> Self {
        Self::pair(MEETING_SUCCESS, SUCCESS_CODE)
    }

    /// `("MEETING ERROR", code)`.
    #[must_use]
    pub fn meeting_error(code: i64) -> Self {
        Self::pair(MEETING_ERROR, code.to_string())
    }

    /// `("MEETING_STATUS_UNKNOWN", reason)`.
    #[must_use]
    pub fn status_unknown(reason: &str) -> Self {
        Self::pair(STATUS_UNKNOWN, reason)
    }

    /// `("ALREADY PENDING", held)`, naming the command holding the slot.
    #[must_use]
    pub fn already_pending(held: &str) -> Self {
        Self::pair(ALREADY_PENDING, held)
    }

    /// Whether this reply reports success.
    ///
    /// Used for log levels only; callers interpret replies themselves.
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            Self::Codes(error, _) => *error == 0,
            Self::Flag(value) => *value,
            Self::Pair(category, _) => !matches!(
                category.as_str(),
                SDK_ERROR
                    | LOGIN_ERROR
                    | LOGIN_REQUIRED
                    | MEETING_ERROR
                    | STATUS_UNKNOWN
                    | ALREADY_PENDING
                    | AUDIO_ERROR
            ),
            Self::Empty => true,
            Self::NotImplemented => false,
        }
    }
}

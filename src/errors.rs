//! Error types shared across the bridge.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all bridge failure modes.
///
/// Command handlers never return these to the command caller directly;
/// they are folded into a [`Reply`](crate::models::reply::Reply) tuple at
/// the dispatcher boundary.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// IPC communication failure.
    Ipc(String),
    /// File-system or I/O operation failure.
    Io(String),
    /// The SDK rejected a call with the given error code.
    Sdk(i64),
    /// A command needing the SDK arrived before initialization succeeded.
    NotInitialized,
    /// A command that must park its responder found the slot occupied.
    /// Carries the name of the command holding the slot.
    AlreadyPending(String),
    /// The command name is not recognized.
    Unimplemented(String),
    /// The bridge task is no longer running.
    Bridge(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Ipc(msg) => write!(f, "ipc: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
            Self::Sdk(code) => write!(f, "sdk: error code {code}"),
            Self::NotInitialized => write!(f, "sdk: not initialized"),
            Self::AlreadyPending(held) => write!(f, "already pending: {held}"),
            Self::Unimplemented(name) => write!(f, "unimplemented: {name}"),
            Self::Bridge(msg) => write!(f, "bridge: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

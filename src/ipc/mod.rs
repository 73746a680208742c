//! Local IPC layer for `meeting-bridge-ctl` and other host processes.
//!
//! Provides a named pipe (Windows) or Unix domain socket (Linux/macOS)
//! server that accepts JSON-line commands and streams topic events.

pub mod codec;
pub mod server;

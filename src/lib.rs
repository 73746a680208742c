#![forbid(unsafe_code)]

//! Coordination core between a host command channel and a callback-driven
//! meeting SDK.

pub mod bridge;
pub mod config;
pub mod errors;
pub mod ipc;
pub mod models;
pub mod relay;
pub mod sdk;
pub mod state;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};

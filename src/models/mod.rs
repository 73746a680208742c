//! Domain model module declarations.

pub mod command;
pub mod options;
pub mod reply;
pub mod session;
pub mod status;

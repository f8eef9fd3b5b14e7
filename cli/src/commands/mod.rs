//! Command implementations

pub mod action;
pub mod config;
pub mod status;
pub mod version;
pub mod watch;

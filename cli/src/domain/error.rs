//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

use crate::domain::instance::{Action, InstanceId, ReconciledState};

/// User-facing message for any failed status query.
///
/// The provider's own error is logged, never shown.
pub const POLL_FAILURE_MESSAGE: &str =
    "Failed to contact server. Check your config and network connection";

// ── Engine errors ─────────────────────────────────────────────────────────────

/// A status query failed. Transient; never mutates the directory.
#[derive(Debug, Error)]
#[error("Failed to contact server. Check your config and network connection")]
pub struct QueryError {
    /// Provider/transport detail, for logs only.
    pub detail: String,
}

/// A start/stop command failed. Displays the provider's message verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct CommandError {
    pub instance_id: InstanceId,
    pub action: Action,
    pub message: String,
}

/// A command request that does not match the instance's current state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Instance '{0}' is not tracked.")]
    UnknownInstance(InstanceId),

    #[error("Cannot {requested} instance '{id}' while it is {current}.")]
    ActionUnavailable {
        id: InstanceId,
        requested: Action,
        current: ReconciledState,
    },

    #[error("Unknown action '{0}'. Expected 'start' or 'stop'.")]
    UnknownAction(String),
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\nValid values: {valid}")]
    InvalidValue {
        key: String,
        value: String,
        valid: String,
    },

    #[error("Invalid instance ID '{0}': must look like i-0123456789abcdef0")]
    InvalidInstanceId(String),
}

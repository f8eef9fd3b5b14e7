//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod instance;
pub mod reconcile;

pub use config::{SwitchboardConfig, validate_config_key, validate_config_value, validate_instance_id};
pub use error::{CommandError, ConfigError, POLL_FAILURE_MESSAGE, QueryError, ValidationError};
pub use instance::{
    Action, Directory, InstanceGroup, InstanceId, RawInstance, ReconciledState, Snapshot,
    TrackedInstance, map_raw_state,
};

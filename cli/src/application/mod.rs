//! Application layer: port trait definitions and use-case orchestration.
//!
//! This module depends only on `crate::domain`, never on `crate::infra`,
//! `crate::commands`, or `crate::output`.

pub mod ports;
pub mod services;

pub use ports::{Ack, CommandRunner, ConfigStore, InstanceCommand, InstanceQuery, ProgressReporter};
pub use services::dispatcher::DispatchOutcome;
pub use services::engine::{Engine, EngineSettings};
pub use services::error_surface::{ErrorState, ErrorSurface};
pub use services::poller::PollOutcome;

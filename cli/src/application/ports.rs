//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.
//!
//! The instance ports return `Send` futures so the poll loop can run as a
//! spawned task. Implementations are free to write plain `async fn`.

use std::future::Future;
use std::path::PathBuf;
use std::process::Output;

use anyhow::Result;

use crate::domain::SwitchboardConfig;
use crate::domain::instance::{InstanceGroup, InstanceId};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Acknowledgement of an accepted start/stop command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ack {
    /// Provider-reported state of each instance right after the call, if known.
    pub current_states: Vec<(InstanceId, String)>,
}

// ── Instance Ports ────────────────────────────────────────────────────────────

/// Batched lifecycle-state query.
pub trait InstanceQuery: Send + Sync {
    /// Describe the given instances in one call.
    ///
    /// An empty `ids` slice describes every instance visible to the
    /// configured credentials. The response is grouped the way the provider
    /// groups it; callers flatten.
    fn describe_instances(
        &self,
        ids: &[InstanceId],
    ) -> impl Future<Output = Result<Vec<InstanceGroup>>> + Send;
}

/// Start/stop commands.
pub trait InstanceCommand: Send + Sync {
    /// Ask the provider to start the given instances.
    fn start_instances(&self, ids: &[InstanceId]) -> impl Future<Output = Result<Ack>> + Send;
    /// Ask the provider to stop the given instances.
    fn stop_instances(&self, ids: &[InstanceId]) -> impl Future<Output = Result<Ack>> + Send;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
pub trait CommandRunner: Send + Sync {
    /// Run a program and capture its output, using the runner's default timeout.
    fn run(&self, program: &str, args: &[&str]) -> impl Future<Output = Result<Output>> + Send;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: std::time::Duration,
    ) -> impl Future<Output = Result<Output>> + Send;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Abstracts configuration persistence (load/save).
pub trait ConfigStore {
    /// Load the configuration, returning defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    fn load(&self) -> Result<SwitchboardConfig>;
    /// Persist the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn save(&self, config: &SwitchboardConfig) -> Result<()>;
    /// Location of the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    fn path(&self) -> Result<PathBuf>;
}

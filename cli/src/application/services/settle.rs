//! Application service: wait for a dispatched instance to settle.
//!
//! Used by `start --wait` / `stop --wait`. Polls through the engine so the
//! directory stays the single source of truth.

use std::time::Duration;

use anyhow::Result;

use crate::application::ports::{InstanceCommand, InstanceQuery, ProgressReporter};
use crate::application::services::engine::Engine;
use crate::application::services::poller::PollOutcome;
use crate::domain::instance::{Action, InstanceId, ReconciledState, TrackedInstance};

/// The reconciled state a successful `action` ends in.
#[must_use]
pub fn target_state(action: Action) -> ReconciledState {
    match action {
        Action::Start => ReconciledState::Running,
        Action::Stop => ReconciledState::Stopped,
    }
}

/// Poll until `id` reaches the target state of `action` (or is terminated).
///
/// Failed polls are reported as warnings and retried; the error surface keeps
/// the last one.
///
/// # Errors
///
/// Returns an error if the instance does not settle within `timeout`, or if
/// the directory has no entry for it.
pub async fn wait_until_settled<Q, C>(
    engine: &Engine<Q, C>,
    id: &InstanceId,
    action: Action,
    timeout: Duration,
    reporter: &impl ProgressReporter,
) -> Result<TrackedInstance>
where
    Q: InstanceQuery,
    C: InstanceCommand,
{
    let target = target_state(action);
    let deadline = tokio::time::Instant::now() + timeout;
    let mut last_raw = String::new();

    loop {
        tokio::time::sleep(engine.poll_interval()).await;
        if engine.poll().await == PollOutcome::Failed {
            reporter.warn("status query failed, retrying");
        }

        let snapshot = engine.snapshot();
        let Some(entry) = snapshot.get(id) else {
            anyhow::bail!("instance '{id}' was not found");
        };
        if entry.raw_state() != last_raw {
            last_raw = entry.raw_state().to_string();
            reporter.step(&format!("{id}: {last_raw}"));
        }
        match entry.reconciled() {
            state if state == target => return Ok(entry.clone()),
            ReconciledState::Terminated => {
                anyhow::bail!("instance '{id}' was terminated")
            }
            _ => {}
        }

        if tokio::time::Instant::now() >= deadline {
            anyhow::bail!(
                "instance '{id}' did not reach {target} within {}s (last state: {last_raw})",
                timeout.as_secs()
            );
        }
    }
}

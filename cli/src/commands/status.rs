//! `switchboard status`: one poll, then print the directory.

use std::process::ExitCode;

use anyhow::Result;
use switchboard_common::StatusOutput;

use crate::app::AppContext;
use crate::application::ports::{InstanceCommand, InstanceQuery};
use crate::application::services::engine::Engine;
use crate::application::services::error_surface::ErrorState;
use crate::application::services::poller::PollOutcome;
use crate::domain::instance::Directory;
use crate::output::{json, progress};

/// The read-only view handed to renderers.
#[must_use]
pub fn status_output(directory: &Directory, error: Option<&ErrorState>) -> StatusOutput {
    StatusOutput {
        instances: directory.to_statuses(),
        error: error.map(ErrorState::to_report),
    }
}

/// Run the status command.
///
/// # Errors
///
/// Returns an error if the JSON document cannot be serialized.
pub async fn run<Q, C>(app: &AppContext, engine: &Engine<Q, C>) -> Result<ExitCode>
where
    Q: InstanceQuery,
    C: InstanceCommand,
{
    let pb = (app.output.show_progress() && !app.is_json())
        .then(|| progress::spinner("Querying instances..."));
    let outcome = engine.poll().await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let status = status_output(&engine.snapshot(), engine.error().as_ref());
    if app.is_json() {
        println!("{}", json::format_status(&status)?);
    } else {
        app.human().render_status(&status);
    }

    Ok(if outcome == PollOutcome::Failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

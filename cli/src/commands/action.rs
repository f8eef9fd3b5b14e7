//! `switchboard start` / `switchboard stop`: dispatch one action.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::{InstanceCommand, InstanceQuery};
use crate::application::services::dispatcher::DispatchOutcome;
use crate::application::services::engine::Engine;
use crate::application::services::poller::PollOutcome;
use crate::application::services::settle;
use crate::domain::POLL_FAILURE_MESSAGE;
use crate::domain::instance::{Action, InstanceId, TrackedInstance};
use crate::output::reporter::TerminalReporter;
use crate::output::{OutputContext, json, progress};

/// Arguments shared by `start` and `stop`.
#[derive(Args, Debug, Clone)]
pub struct ActionArgs {
    /// Instance ID (e.g. i-0123456789abcdef0)
    pub instance: String,

    /// Keep polling until the instance reaches its target state
    #[arg(long)]
    pub wait: bool,

    /// Give up waiting after this many seconds
    #[arg(long, default_value_t = 300)]
    pub timeout_secs: u64,
}

/// Run a start or stop command.
///
/// The engine must track the target instance; one poll populates the
/// directory before the dispatch.
///
/// # Errors
///
/// Returns an error if a JSON document cannot be serialized.
pub async fn run<Q, C>(
    app: &AppContext,
    engine: &Engine<Q, C>,
    action: Action,
    args: &ActionArgs,
) -> Result<ExitCode>
where
    Q: InstanceQuery,
    C: InstanceCommand,
{
    let id = InstanceId::from(args.instance.as_str());

    if engine.poll().await == PollOutcome::Failed {
        let message = engine
            .error()
            .map_or_else(|| POLL_FAILURE_MESSAGE.to_string(), |e| e.message);
        return fail(app, &message, "POLL_FAILED");
    }

    match engine.dispatch(&id, action).await {
        DispatchOutcome::Sent => {}
        DispatchOutcome::Ignored(reason) => {
            return fail(app, &reason.to_string(), "ACTION_UNAVAILABLE");
        }
        DispatchOutcome::Failed(err) => return fail(app, &err.message, "COMMAND_FAILED"),
    }

    if !args.wait {
        if let Some(entry) = engine.snapshot().get(&id) {
            report(app, entry, &format!("{} requested for {id}", action.label()))?;
        }
        return Ok(ExitCode::SUCCESS);
    }

    let timeout = Duration::from_secs(args.timeout_secs);
    let quiet = OutputContext::new(true, true);
    let reporter = if app.is_json() {
        TerminalReporter::new(&quiet)
    } else if app.output.show_progress() {
        TerminalReporter::with_spinner(
            &app.output,
            progress::spinner(&format!("Waiting for {id} to {action}...")),
        )
    } else {
        TerminalReporter::new(&app.output)
    };

    let settled = settle::wait_until_settled(engine, &id, action, timeout, &reporter).await;
    match settled {
        Ok(entry) => {
            let message = format!("{id} is {}", entry.raw_state());
            match reporter.spinner() {
                Some(pb) => progress::finish_ok(pb, &message),
                None if !app.is_json() => app.output.success(&message),
                None => {}
            }
            if app.is_json() {
                report(app, &entry, &message)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            if let Some(pb) = reporter.spinner() {
                progress::finish_err(pb, "gave up waiting");
            }
            fail(app, &e.to_string(), "WAIT_FAILED")
        }
    }
}

fn report(app: &AppContext, entry: &TrackedInstance, message: &str) -> Result<()> {
    if app.is_json() {
        println!("{}", serde_json::to_string_pretty(&entry.to_status())?);
    } else {
        app.output.success(message);
    }
    Ok(())
}

fn fail(app: &AppContext, message: &str, code: &str) -> Result<ExitCode> {
    if app.is_json() {
        println!("{}", json::format_error(message, code)?);
    } else {
        app.output.error(message);
    }
    Ok(ExitCode::FAILURE)
}

//! `switchboard watch`: run the engine and stream changes.
//!
//! Commands are read line by line from stdin:
//!
//! ```text
//! start <instance-id>
//! stop <instance-id>
//! dismiss
//! quit
//! ```

use std::future::Future;
use std::io::BufRead;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::app::AppContext;
use crate::application::ports::{InstanceCommand, InstanceQuery};
use crate::application::services::dispatcher::DispatchOutcome;
use crate::application::services::engine::Engine;
use crate::application::services::error_surface::ErrorState;
use crate::commands::status::status_output;
use crate::domain::instance::{Action, Directory, InstanceId};
use crate::output::human::format_table;
use crate::output::json;

/// A parsed stdin command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchCommand {
    Dispatch(InstanceId, Action),
    Dismiss,
    Quit,
}

/// Parse one input line. Blank lines yield `None`.
///
/// # Errors
///
/// Returns an error for unknown commands or a missing instance ID.
pub fn parse_line(line: &str) -> Result<Option<WatchCommand>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let command = match verb.to_ascii_lowercase().as_str() {
        "dismiss" => WatchCommand::Dismiss,
        "quit" | "exit" | "q" => WatchCommand::Quit,
        _ => {
            let action = Action::from_str(verb)?;
            let Some(id) = words.next() else {
                anyhow::bail!("usage: {action} <instance-id>");
            };
            WatchCommand::Dispatch(InstanceId::from(id), action)
        }
    };
    if let Some(extra) = words.next() {
        anyhow::bail!("unexpected argument '{extra}'");
    }
    Ok(Some(command))
}

/// Stream stdin lines from a detached thread.
///
/// A blocking read cannot be cancelled, so the thread is never joined; it
/// ends with the process or when the receiver is dropped.
#[must_use]
pub fn stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "cannot read input");
                    break;
                }
            }
        }
    });
    rx
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Run the watch loop until `quit`, end of input, or `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if a JSON document cannot be serialized.
pub async fn run<Q, C, S>(
    app: &AppContext,
    engine: Arc<Engine<Q, C>>,
    mut input: mpsc::Receiver<String>,
    shutdown: S,
) -> Result<ExitCode>
where
    Q: InstanceQuery + 'static,
    C: InstanceCommand + 'static,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    // Poll once so a signal handler is installed before anything is printed.
    let mut interrupted = tokio::select! {
        biased;
        () = &mut shutdown => true,
        () = std::future::ready(()) => false,
    };

    let mut directory_rx = engine.subscribe();
    let mut error_rx = engine.subscribe_errors();
    let mut dispatches: JoinSet<(InstanceId, Action, DispatchOutcome)> = JoinSet::new();

    if !app.is_json() {
        let scope = if engine.tracked().is_empty() {
            "all instances".to_string()
        } else {
            format!("{} instance(s)", engine.tracked().len())
        };
        app.output.info(&format!(
            "Watching {scope} every {}ms. Commands: start <id>, stop <id>, dismiss, quit",
            engine.poll_interval().as_millis()
        ));
    }

    if !interrupted {
        tokio::select! {
            () = &mut shutdown => interrupted = true,
            _ = engine.poll() => {}
        }
    }
    if !interrupted {
        engine.start().await;
    }

    let result = loop {
        // `shutdown` must not be polled again once it has resolved.
        if interrupted {
            break Ok(());
        }
        tokio::select! {
            () = &mut shutdown => {
                interrupted = true;
                break Ok(());
            }
            changed = directory_rx.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let snapshot = Arc::clone(&directory_rx.borrow_and_update());
                if let Err(e) = render_directory(app, &snapshot, engine.error().as_ref()) {
                    break Err(e);
                }
            }
            changed = error_rx.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let error = error_rx.borrow_and_update().clone();
                if let Err(e) = render_error(app, &engine.snapshot(), error.as_ref()) {
                    break Err(e);
                }
            }
            line = input.recv() => match line {
                Some(line) => match parse_line(&line) {
                    Ok(None) => {}
                    Ok(Some(WatchCommand::Quit)) => break Ok(()),
                    Ok(Some(WatchCommand::Dismiss)) => engine.dismiss_error(),
                    Ok(Some(WatchCommand::Dispatch(id, action))) => {
                        let engine = Arc::clone(&engine);
                        dispatches.spawn(async move {
                            let outcome = engine.dispatch(&id, action).await;
                            (id, action, outcome)
                        });
                    }
                    Err(e) => app.output.warn(&e.to_string()),
                },
                None => break Ok(()),
            },
            Some(joined) = dispatches.join_next(), if !dispatches.is_empty() => {
                report_dispatch(app, joined);
            }
        }
    };

    engine.stop().await;
    if interrupted {
        dispatches.shutdown().await;
    } else {
        while let Some(joined) = dispatches.join_next().await {
            report_dispatch(app, joined);
        }
    }
    result.map(|()| ExitCode::SUCCESS)
}

fn report_dispatch(
    app: &AppContext,
    joined: Result<(InstanceId, Action, DispatchOutcome), tokio::task::JoinError>,
) {
    match joined {
        Ok((id, action, DispatchOutcome::Sent)) => {
            debug!(instance_id = %id, %action, "dispatch sent");
        }
        Ok((_, _, DispatchOutcome::Ignored(reason))) => {
            if !app.is_json() {
                app.output.warn(&format!("Ignored: {reason}"));
            }
        }
        // Surfaced through the error channel.
        Ok((_, _, DispatchOutcome::Failed(_))) => {}
        Err(e) => warn!(error = %e, "dispatch task failed"),
    }
}

fn render_directory(app: &AppContext, directory: &Directory, error: Option<&ErrorState>) -> Result<()> {
    if app.is_json() {
        println!("{}", json::format_status_line(&status_output(directory, error))?);
        return Ok(());
    }
    if app.output.quiet {
        return Ok(());
    }
    app.output
        .header(&format!("── {} ──", Local::now().format("%H:%M:%S")));
    if directory.is_empty() {
        app.output.info("No instances found.");
        return Ok(());
    }
    for line in format_table(&directory.to_statuses(), &app.output.styles) {
        println!("{line}");
    }
    Ok(())
}

fn render_error(app: &AppContext, directory: &Directory, error: Option<&ErrorState>) -> Result<()> {
    if app.is_json() {
        println!("{}", json::format_status_line(&status_output(directory, error))?);
        return Ok(());
    }
    match error {
        Some(error) => app.human().render_error(&error.to_report()),
        None => app.output.info("Error dismissed."),
    }
    Ok(())
}

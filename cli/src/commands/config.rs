//! `switchboard config`: show and set configuration values.

use anyhow::{Context, Result};
use clap::Subcommand;
use std::process::ExitCode;

use crate::app::AppContext;
use crate::application::ports::ConfigStore;
use crate::application::services::config_service;

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Set configuration value
    Set {
        /// Configuration key (provider.region, provider.profile, poll.interval_ms)
        key: String,
        /// Configuration value
        value: String,
    },
    /// Print the config file location
    Path,
}

/// Run the config command.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or written, or if the
/// key or value is invalid.
pub fn run(app: &AppContext, cmd: ConfigCommand) -> Result<ExitCode> {
    match cmd {
        ConfigCommand::Show => show_config(app),
        ConfigCommand::Set { key, value } => set_config(app, &key, &value),
        ConfigCommand::Path => {
            let path = app.config_store.path()?;
            if app.is_json() {
                println!("{}", serde_json::json!({ "path": path }));
            } else {
                println!("{}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn show_config(app: &AppContext) -> Result<ExitCode> {
    let config = app.config()?;
    let path = app.config_store.path()?;
    if app.is_json() {
        println!(
            "{}",
            serde_json::to_string_pretty(&config).context("JSON serialization failed")?
        );
    } else {
        app.human().render_config(&config, &path.display().to_string());
    }
    Ok(ExitCode::SUCCESS)
}

fn set_config(app: &AppContext, key: &str, value: &str) -> Result<ExitCode> {
    config_service::set_value(&app.config_store, key, value)?;
    if app.is_json() {
        println!("{}", serde_json::json!({ "key": key, "value": value }));
    } else {
        app.output.success(&format!("Set {key} = {value}"));
    }
    Ok(ExitCode::SUCCESS)
}

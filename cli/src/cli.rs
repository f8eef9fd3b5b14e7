//! CLI argument parsing with clap derive

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use crate::app::{AppContext, AppFlags, OutputFlags};
use crate::application::services::config_service::ConfigOverrides;
use crate::commands;
use crate::commands::action::ActionArgs;
use crate::domain::config::validate_instance_id;
use crate::domain::instance::{Action, InstanceId};

/// Watch and start/stop cloud compute instances
#[derive(Parser)]
#[command(
    name = "switchboard",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Log engine activity to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Provider region (overrides provider.region)
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Provider credentials profile (overrides provider.profile)
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Poll period in milliseconds (overrides poll.interval_ms)
    #[arg(long, global = true)]
    pub interval_ms: Option<u64>,

    /// Track this instance (repeatable; overrides the configured list)
    #[arg(short = 'i', long = "instance", global = true, action = ArgAction::Append)]
    pub instances: Vec<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Poll once and show instance states
    Status,

    /// Keep polling and accept commands on stdin
    Watch,

    /// Start an instance
    Start(ActionArgs),

    /// Stop an instance
    Stop(ActionArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the command fails.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            verbose: _,
            region,
            profile,
            interval_ms,
            instances,
            command,
        } = self;
        let app = AppContext::new(AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            overrides: ConfigOverrides {
                region,
                profile,
                interval_ms,
                instances,
            },
        });

        match command {
            Command::Version => {
                commands::version::run(&app)?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Config(cmd) => commands::config::run(&app, cmd),
            Command::Status => {
                let config = app.config()?;
                let engine = app.engine(&config, None);
                commands::status::run(&app, &engine).await
            }
            Command::Watch => {
                let config = app.config()?;
                let engine = Arc::new(app.engine(&config, None));
                let input = commands::watch::stdin_lines();
                commands::watch::run(&app, engine, input, commands::watch::ctrl_c()).await
            }
            Command::Start(args) => run_action(&app, Action::Start, &args).await,
            Command::Stop(args) => run_action(&app, Action::Stop, &args).await,
        }
    }
}

/// One-shot actions track only the target instance.
async fn run_action(app: &AppContext, action: Action, args: &ActionArgs) -> Result<ExitCode> {
    validate_instance_id(&args.instance)?;
    let config = app.config()?;
    let engine = app.engine(&config, Some(vec![InstanceId::from(args.instance.as_str())]));
    commands::action::run(app, &engine, action, args).await
}

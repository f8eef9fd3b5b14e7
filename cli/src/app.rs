//! Application context: unified state passed to every command handler.
//!
//! `AppContext` carries the output context, the config store and the
//! per-invocation overrides. Adding a new cross-cutting concern requires
//! one field here and no command signature changes.

use anyhow::Result;

use crate::application::services::config_service::{self, ConfigOverrides};
use crate::application::services::engine::{Engine, EngineSettings};
use crate::domain::config::SwitchboardConfig;
use crate::domain::instance::InstanceId;
use crate::infra::aws::AwsCliProvider;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlConfigStore;
use crate::output::OutputContext;
use crate::output::human::HumanRenderer;

/// The production provider: EC2 through the `aws` CLI.
pub type AwsProvider = AwsCliProvider<TokioCommandRunner>;

/// The production engine.
pub type AwsEngine = Engine<AwsProvider, AwsProvider>;

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    pub output: OutputFlags,
    pub overrides: ConfigOverrides,
}

/// Unified application context passed to every command handler.
///
/// Constructed once in `Cli::run()` and passed as `&AppContext` to all
/// command handlers.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    pub config_store: YamlConfigStore,
    /// Command-line overrides applied on top of the config file.
    pub overrides: ConfigOverrides,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    #[must_use]
    pub fn new(flags: AppFlags) -> Self {
        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        Self {
            output: OutputContext::new(flags.output.no_color, flags.output.quiet),
            mode,
            config_store: YamlConfigStore,
            overrides: flags.overrides,
        }
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    #[must_use]
    pub fn human(&self) -> HumanRenderer<'_> {
        HumanRenderer::new(&self.output)
    }

    /// Effective configuration: file plus overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or a value is invalid.
    pub fn config(&self) -> Result<SwitchboardConfig> {
        config_service::load_config(&self.config_store, &self.overrides)
    }

    /// Build an engine over the `aws` CLI.
    ///
    /// `tracked` replaces the configured instance list when given.
    #[must_use]
    pub fn engine(&self, config: &SwitchboardConfig, tracked: Option<Vec<InstanceId>>) -> AwsEngine {
        let provider = AwsProvider::default_runner(
            config.provider.region.clone(),
            config.provider.profile.clone(),
        );
        Engine::new(
            provider.clone(),
            provider,
            EngineSettings {
                tracked: tracked.unwrap_or_else(|| config.instances.clone()),
                poll_interval: config.poll_interval(),
            },
        )
    }
}

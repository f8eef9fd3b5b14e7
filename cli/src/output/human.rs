//! Human-readable terminal renderer.

use owo_colors::OwoColorize as _;
use switchboard_common::{ErrorReport, InstanceStatus, StatusOutput};

use crate::domain::config::SwitchboardConfig;
use crate::output::{OutputContext, Styles};

const HEADERS: [&str; 4] = ["INSTANCE", "NAME", "STATE", "ACTION"];

/// Renders engine state as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        if self.ctx.quiet {
            return;
        }
        self.ctx.info(&format!("switchboard v{version}"));
    }

    /// Render the instance table followed by the active error, if any.
    pub fn render_status(&self, status: &StatusOutput) {
        if !self.ctx.quiet {
            if status.instances.is_empty() {
                self.ctx.info("No instances found.");
            } else {
                for line in format_table(&status.instances, &self.ctx.styles) {
                    println!("{line}");
                }
            }
        }
        if let Some(error) = &status.error {
            self.render_error(error);
        }
    }

    /// Errors go to stderr and are never suppressed.
    pub fn render_error(&self, error: &ErrorReport) {
        self.ctx.error(&error.message);
    }

    pub fn render_config(&self, config: &SwitchboardConfig, path: &str) {
        self.ctx.header("Configuration");
        self.ctx.kv("File:          ", path);
        self.ctx.kv(
            "Region:        ",
            config.provider.region.as_deref().unwrap_or("(provider default)"),
        );
        self.ctx.kv(
            "Profile:       ",
            config.provider.profile.as_deref().unwrap_or("(provider default)"),
        );
        self.ctx
            .kv("Poll interval: ", &format!("{}ms", config.poll.interval_ms));
        let instances = if config.instances.is_empty() {
            "(all)".to_string()
        } else {
            config
                .instances
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        self.ctx.kv("Instances:     ", &instances);
    }
}

/// Lay out the instance table. Columns are padded before styling so ANSI
/// codes never skew the alignment.
#[must_use]
pub fn format_table(instances: &[InstanceStatus], styles: &Styles) -> Vec<String> {
    let rows: Vec<[String; 4]> = instances
        .iter()
        .map(|i| {
            let action = if i.disabled {
                format!("({})", i.action_label)
            } else {
                i.action_label.clone()
            };
            [
                i.id.clone(),
                i.name.clone().unwrap_or_else(|| "-".to_string()),
                i.raw_state.clone(),
                action,
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    let header = HEADERS
        .iter()
        .zip(widths)
        .map(|(h, w)| format!("{h:<w$}"))
        .collect::<Vec<_>>()
        .join("  ");
    lines.push(format!("  {}", header.trim_end().style(styles.bold)));

    for (row, instance) in rows.iter().zip(instances) {
        let state_style = styles.for_state(instance.state);
        let id = format!("{:<w$}", row[0], w = widths[0]);
        let name = format!("{:<w$}", row[1], w = widths[1]);
        let state = format!("{:<w$}", row[2], w = widths[2]);
        let action = if instance.disabled {
            format!("{}", row[3].style(styles.dim))
        } else {
            row[3].clone()
        };
        lines.push(format!(
            "  {id}  {name}  {}  {action}",
            state.style(state_style)
        ));
    }
    lines
}

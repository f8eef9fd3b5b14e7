//! Output styles using owo-colors stylesheet pattern

use owo_colors::Style;
use switchboard_common::PresentedState;

/// Centralized stylesheet for CLI output colors.
#[derive(Default, Clone)]
pub struct Styles {
    /// Success messages (green)
    pub success: Style,
    /// Warning messages (yellow)
    pub warning: Style,
    /// Error messages (red)
    pub error: Style,
    /// Info messages (blue)
    pub info: Style,
    /// Dimmed/secondary text
    pub dim: Style,
    /// Bold text
    pub bold: Style,
    /// Headers/section titles
    pub header: Style,
    pub running: Style,
    pub stopped: Style,
    pub terminated: Style,
    pub transitioning: Style,
}

impl Styles {
    /// Apply colors to the stylesheet.
    pub fn colorize(&mut self) {
        self.success = Style::new().green();
        self.warning = Style::new().yellow();
        self.error = Style::new().red();
        self.info = Style::new().blue();
        self.dim = Style::new().dimmed();
        self.bold = Style::new().bold();
        self.header = Style::new().bold().cyan();
        self.running = Style::new().green();
        self.stopped = Style::new().dimmed();
        self.terminated = Style::new().red();
        self.transitioning = Style::new().yellow();
    }

    /// Style for an instance in the given presented state.
    #[must_use]
    pub fn for_state(&self, state: PresentedState) -> Style {
        match state {
            PresentedState::Running => self.running,
            PresentedState::Stopped => self.stopped,
            PresentedState::Terminated => self.terminated,
            PresentedState::Transitioning => self.transitioning,
        }
    }
}

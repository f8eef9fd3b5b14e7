//! Terminal and JSON rendering for switchboard commands.
//!
//! `OutputContext` is the only place that writes human-facing lines. It
//! decides colour once, from `--no-color`, `NO_COLOR` and whether stdout is a
//! terminal, and every line it prints honours `--quiet` except errors.
//! Instance tables live in [`human`], `--json` documents in [`json`].

pub mod human;
pub mod json;
pub mod progress;
pub mod reporter;
pub mod styles;

use console::Term;
use owo_colors::{OwoColorize as _, Style};
pub use styles::Styles;

/// Rendering state shared by every command handler.
pub struct OutputContext {
    pub styles: Styles,
    /// stdout is a terminal; spinners are only drawn there.
    pub is_tty: bool,
    /// `--quiet`: only errors are printed.
    pub quiet: bool,
}

impl OutputContext {
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let mut styles = Styles::default();
        if !no_color && is_tty && std::env::var_os("NO_COLOR").is_none() {
            styles.colorize();
        }
        Self {
            styles,
            is_tty,
            quiet,
        }
    }

    /// Spinners need a terminal and are hidden by `--quiet`.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.is_tty && !self.quiet
    }

    fn marked(&self, mark: &str, style: Style, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", mark.style(style));
        }
    }

    /// `✓ msg`, e.g. a command the provider accepted.
    pub fn success(&self, msg: &str) {
        self.marked("✓", self.styles.success, msg);
    }

    /// `⚠ msg`, e.g. a watch command that was ignored.
    pub fn warn(&self, msg: &str) {
        self.marked("⚠", self.styles.warning, msg);
    }

    /// `✗ msg` on stderr. Printed even with `--quiet`.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {msg}", "✗".style(self.styles.error));
    }

    pub fn info(&self, msg: &str) {
        self.marked("ℹ", self.styles.info, msg);
    }

    /// Section title, such as the timestamp line above each watch table.
    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// `key  value` with the key dimmed, as used by `config show`.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {}  {value}", key.style(self.styles.dim));
        }
    }
}

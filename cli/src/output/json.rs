//! JSON output helpers.
//!
//! Every `--json` code path goes through here so the document shapes stay in
//! one place.

use anyhow::{Context, Result};
use switchboard_common::StatusOutput;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Format a status document (`status --json`).
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_status(status: &StatusOutput) -> Result<String> {
    serde_json::to_string_pretty(status).context("JSON serialization failed")
}

/// Format a status document as a single line, for streaming (`watch --json`).
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_status_line(status: &StatusOutput) -> Result<String> {
    serde_json::to_string(status).context("JSON serialization failed")
}

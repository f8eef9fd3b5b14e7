//! `switchboard version`.

use anyhow::Result;

use crate::app::AppContext;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Print the CLI version.
///
/// # Errors
///
/// Returns an error if the JSON document cannot be serialized.
pub fn run(app: &AppContext) -> Result<()> {
    if app.is_json() {
        println!("{}", serde_json::to_string(&serde_json::json!({ "version": VERSION }))?);
    } else {
        app.human().render_version(VERSION);
    }
    Ok(())
}

//! Shared status types for switchboard.
//!
//! These are the read-only shapes handed to presentation layers (the CLI's
//! `--json` output today). They carry no reconciliation logic.

pub mod types;

pub use types::*;

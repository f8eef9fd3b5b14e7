//! Domain types and validators for switchboard configuration.
//!
//! Pure functions only, no I/O, no async, no filesystem access.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;
use crate::domain::instance::InstanceId;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &["provider.region", "provider.profile", "poll.interval_ms"];

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
pub const MIN_POLL_INTERVAL_MS: u64 = 500;
pub const MAX_POLL_INTERVAL_MS: u64 = 60_000;

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.switchboard/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SwitchboardConfig {
    /// Provider connection settings.
    pub provider: ProviderConfig,
    /// Polling settings.
    pub poll: PollConfig,
    /// Tracked instance IDs. Empty tracks every instance the credentials can see.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub instances: Vec<InstanceId>,
}

/// Provider connection settings, passed through to the provider CLI.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ProviderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

/// Polling configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollConfig {
    /// Period between status queries, in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

fn default_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl SwitchboardConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll.interval_ms)
    }

    /// Validate every field loaded from disk or overridden on the command line.
    ///
    /// # Errors
    ///
    /// Returns an error for an out-of-range interval or a malformed instance ID.
    pub fn validate(&self) -> Result<()> {
        validate_config_value("poll.interval_ms", &self.poll.interval_ms.to_string())?;
        for id in &self.instances {
            validate_instance_id(id.as_str())?;
        }
        Ok(())
    }

    /// Set a single key (one of [`VALID_CONFIG_KEYS`]) from its string form.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_config_key(key)?;
        validate_config_value(key, value)?;
        match key {
            "provider.region" => self.provider.region = Some(value.to_string()),
            "provider.profile" => self.provider.profile = Some(value.to_string()),
            _ => self.poll.interval_ms = value.parse()?,
        }
        Ok(())
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    match key {
        "poll.interval_ms" => {
            let in_range = value
                .parse::<u64>()
                .is_ok_and(|ms| (MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS).contains(&ms));
            if !in_range {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                    valid: format!("{MIN_POLL_INTERVAL_MS}..={MAX_POLL_INTERVAL_MS}"),
                }
                .into());
            }
        }
        "provider.region" | "provider.profile" => {
            let ok = !value.is_empty()
                && value
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
            if !ok {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                    valid: "letters, digits, '-', '_' or '.'".to_string(),
                }
                .into());
            }
        }
        _ => {}
    }
    Ok(())
}

/// Validates an EC2-style instance ID: `i-` followed by 8 or 17 hex digits.
///
/// # Errors
///
/// Returns an error if the ID doesn't match the expected format.
pub fn validate_instance_id(id: &str) -> Result<()> {
    let Some(hex) = id.strip_prefix("i-") else {
        return Err(ConfigError::InvalidInstanceId(id.to_string()).into());
    };
    if !matches!(hex.len(), 8 | 17) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ConfigError::InvalidInstanceId(id.to_string()).into());
    }
    Ok(())
}

// ── Unit tests ───────────────────────────────────────────────────────────────

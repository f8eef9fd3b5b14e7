//! Application service: configuration use-cases.

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::config::{SwitchboardConfig, validate_instance_id};
use crate::domain::instance::InstanceId;

/// Per-invocation overrides taken from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub region: Option<String>,
    pub profile: Option<String>,
    pub interval_ms: Option<u64>,
    /// Replaces the configured instance list when non-empty.
    pub instances: Vec<String>,
}

/// Load configuration and apply overrides, validating the result.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if any value
/// (from the file or an override) is invalid.
pub fn load_config(store: &impl ConfigStore, overrides: &ConfigOverrides) -> Result<SwitchboardConfig> {
    let mut config = store.load()?;
    if let Some(region) = &overrides.region {
        config.set("provider.region", region)?;
    }
    if let Some(profile) = &overrides.profile {
        config.set("provider.profile", profile)?;
    }
    if let Some(ms) = overrides.interval_ms {
        config.set("poll.interval_ms", &ms.to_string())?;
    }
    if !overrides.instances.is_empty() {
        for id in &overrides.instances {
            validate_instance_id(id)?;
        }
        config.instances = overrides.instances.iter().map(|id| InstanceId::from(id.as_str())).collect();
    }
    config.validate()?;
    Ok(config)
}

/// Set a single key and persist the configuration.
///
/// # Errors
///
/// Returns an error if the key or value is invalid or the file cannot be written.
pub fn set_value(store: &impl ConfigStore, key: &str, value: &str) -> Result<SwitchboardConfig> {
    let mut config = store.load()?;
    config.set(key, value)?;
    store.save(&config)?;
    Ok(config)
}

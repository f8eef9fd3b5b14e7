//! Instance domain types: identifiers, reconciled states, and the directory.
//!
//! This module is intentionally free of I/O, async, and external layer imports.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use switchboard_common::{InstanceStatus, PresentedState};

use crate::domain::error::ValidationError;

// ── Raw state names ──────────────────────────────────────────────────────────

pub const RAW_STOPPED: &str = "stopped";
pub const RAW_RUNNING: &str = "running";
pub const RAW_TERMINATED: &str = "terminated";
pub const RAW_PENDING: &str = "pending";
pub const RAW_STOPPING: &str = "stopping";

/// Tag whose value is used as the display name of an instance.
pub const NAME_TAG: &str = "Name";

// ── Identifiers ──────────────────────────────────────────────────────────────

/// Opaque provider identifier of a compute instance (e.g. `i-0abc...`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for InstanceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ── Actions ──────────────────────────────────────────────────────────────────

/// A user-initiated power action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Start,
    Stop,
}

impl Action {
    /// Raw state written optimistically while the command is in flight.
    #[must_use]
    pub fn optimistic_raw_state(self) -> &'static str {
        match self {
            Self::Start => RAW_PENDING,
            Self::Stop => RAW_STOPPING,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Stop => "Stop",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::Stop => "stop",
        })
    }
}

impl FromStr for Action {
    type Err = ValidationError;

    /// Accepts `start`/`stop` in any case, plus the legacy button captions
    /// `Start Server`/`Stop Server`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" | "start server" => Ok(Self::Start),
            "stop" | "stop server" => Ok(Self::Stop),
            _ => Err(ValidationError::UnknownAction(s.to_string())),
        }
    }
}

// ── Reconciled state ─────────────────────────────────────────────────────────

/// Local presentation/action state derived from a raw lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReconciledState {
    Stopped,
    Running,
    Terminated,
    /// `pending`, `stopping`, and every state this crate does not recognise.
    Transitioning,
}

impl ReconciledState {
    /// The action the control for this state issues, if any.
    #[must_use]
    pub fn action(self) -> Option<Action> {
        match self {
            Self::Stopped => Some(Action::Start),
            Self::Running => Some(Action::Stop),
            Self::Terminated | Self::Transitioning => None,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Stopped => Action::Start.label(),
            Self::Running => Action::Stop.label(),
            Self::Terminated => "Terminated",
            Self::Transitioning => "Transition",
        }
    }

    #[must_use]
    pub fn is_disabled(self) -> bool {
        self.action().is_none()
    }

    #[must_use]
    pub fn presented(self) -> PresentedState {
        match self {
            Self::Stopped => PresentedState::Stopped,
            Self::Running => PresentedState::Running,
            Self::Terminated => PresentedState::Terminated,
            Self::Transitioning => PresentedState::Transitioning,
        }
    }
}

impl fmt::Display for ReconciledState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Terminated => "terminated",
            Self::Transitioning => "transitioning",
        })
    }
}

/// Map a provider lifecycle state to its reconciled state.
///
/// Total: any string outside `stopped`, `running` and `terminated` is
/// `Transitioning`.
#[must_use]
pub fn map_raw_state(raw: &str) -> ReconciledState {
    match raw {
        RAW_STOPPED => ReconciledState::Stopped,
        RAW_RUNNING => ReconciledState::Running,
        RAW_TERMINATED => ReconciledState::Terminated,
        _ => ReconciledState::Transitioning,
    }
}

// ── Records ──────────────────────────────────────────────────────────────────

/// One instance as reported by the query port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInstance {
    pub id: InstanceId,
    pub state: String,
    pub tags: BTreeMap<String, String>,
}

/// A provider-defined grouping of instances (an EC2 reservation).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceGroup {
    pub instances: Vec<RawInstance>,
}

/// A directory entry. `reconciled` and `is_transitioning` are always derived
/// from `raw_state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedInstance {
    id: InstanceId,
    raw_state: String,
    reconciled: ReconciledState,
    tags: BTreeMap<String, String>,
    is_transitioning: bool,
}

impl TrackedInstance {
    #[must_use]
    pub fn new(id: InstanceId, raw_state: impl Into<String>, tags: BTreeMap<String, String>) -> Self {
        let raw_state = raw_state.into();
        let reconciled = map_raw_state(&raw_state);
        Self {
            id,
            raw_state,
            reconciled,
            tags,
            is_transitioning: reconciled == ReconciledState::Transitioning,
        }
    }

    /// Same instance with a different raw state.
    #[must_use]
    pub fn with_raw_state(&self, raw_state: &str) -> Self {
        Self::new(self.id.clone(), raw_state, self.tags.clone())
    }

    #[must_use]
    pub fn id(&self) -> &InstanceId {
        &self.id
    }

    #[must_use]
    pub fn raw_state(&self) -> &str {
        &self.raw_state
    }

    #[must_use]
    pub fn reconciled(&self) -> ReconciledState {
        self.reconciled
    }

    #[must_use]
    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.is_transitioning
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.tags.get(NAME_TAG).map(String::as_str)
    }

    #[must_use]
    pub fn to_status(&self) -> InstanceStatus {
        InstanceStatus {
            id: self.id.to_string(),
            name: self.name().map(String::from),
            raw_state: self.raw_state.clone(),
            state: self.reconciled.presented(),
            action_label: self.reconciled.label().to_string(),
            disabled: self.reconciled.is_disabled(),
            tags: self.tags.clone(),
        }
    }
}

impl From<RawInstance> for TrackedInstance {
    fn from(raw: RawInstance) -> Self {
        Self::new(raw.id, raw.state, raw.tags)
    }
}

// ── Directory ────────────────────────────────────────────────────────────────

/// Last-known reconciled state per instance, keyed by id.
///
/// Equality is structural and independent of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    entries: BTreeMap<InstanceId, TrackedInstance>,
}

/// Directory snapshot as handed to readers.
pub type Snapshot = Arc<Directory>;

impl Directory {
    #[must_use]
    pub fn get(&self, id: &InstanceId) -> Option<&TrackedInstance> {
        self.entries.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedInstance> {
        self.entries.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or overwrite an entry.
    pub fn upsert(&mut self, instance: TrackedInstance) {
        self.entries.insert(instance.id.clone(), instance);
    }

    #[must_use]
    pub fn to_statuses(&self) -> Vec<InstanceStatus> {
        self.iter().map(TrackedInstance::to_status).collect()
    }
}

impl FromIterator<TrackedInstance> for Directory {
    fn from_iter<I: IntoIterator<Item = TrackedInstance>>(iter: I) -> Self {
        let mut dir = Self::default();
        for instance in iter {
            dir.upsert(instance);
        }
        dir
    }
}

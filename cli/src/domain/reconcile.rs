//! Pure reconciliation logic shared by the poller and the dispatcher.
//!
//! Nothing here performs I/O. The engine service owns the directory and calls
//! into these functions to decide whether a new snapshot is worth publishing.

use crate::domain::error::ValidationError;
use crate::domain::instance::{Action, Directory, InstanceGroup, InstanceId, RawInstance, TrackedInstance};

/// Flatten the provider's grouped response into one sequence of records.
#[must_use]
pub fn flatten(groups: Vec<InstanceGroup>) -> Vec<RawInstance> {
    groups.into_iter().flat_map(|g| g.instances).collect()
}

/// Change-detection gate.
///
/// Overlays `records` on `previous` and compares the result structurally with
/// `previous`. Returns `None` when nothing changed, so callers publish nothing.
/// Entries missing from `records` are kept as they were.
#[must_use]
pub fn reconcile(previous: &Directory, records: Vec<RawInstance>) -> Option<Directory> {
    let mut next = previous.clone();
    for record in records {
        next.upsert(TrackedInstance::from(record));
    }
    (next != *previous).then_some(next)
}

/// Check that `action` is what the instance's control currently offers.
///
/// # Errors
///
/// Returns `UnknownInstance` when the directory has no such entry and
/// `ActionUnavailable` when the current state offers a different action or none.
pub fn validate_action(
    dir: &Directory,
    id: &InstanceId,
    action: Action,
) -> Result<(), ValidationError> {
    let entry = dir
        .get(id)
        .ok_or_else(|| ValidationError::UnknownInstance(id.clone()))?;
    if entry.reconciled().action() == Some(action) {
        Ok(())
    } else {
        Err(ValidationError::ActionUnavailable {
            id: id.clone(),
            requested: action,
            current: entry.reconciled(),
        })
    }
}

/// Apply the optimistic transition for `action` to an existing entry.
///
/// Returns `false` if the entry does not exist.
pub fn apply_optimistic(dir: &mut Directory, id: &InstanceId, action: Action) -> bool {
    let Some(entry) = dir.get(id) else {
        return false;
    };
    let next = entry.with_raw_state(action.optimistic_raw_state());
    dir.upsert(next);
    true
}

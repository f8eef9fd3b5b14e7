//! Property-based tests for the state mapping, the change gate and config
//! validation.
//!
//! Uses `proptest` to verify invariants across many random inputs.

#![allow(clippy::expect_used)]

use std::collections::BTreeMap;

use proptest::prelude::*;

use switchboard_cli::domain::config::{
    MAX_POLL_INTERVAL_MS, MIN_POLL_INTERVAL_MS, validate_config_key, validate_config_value,
    validate_instance_id,
};
use switchboard_cli::domain::instance::{
    Action, Directory, InstanceId, RawInstance, ReconciledState, TrackedInstance, map_raw_state,
};
use switchboard_cli::domain::reconcile;

fn raw_state() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("pending".to_string()),
        Just("running".to_string()),
        Just("stopping".to_string()),
        Just("stopped".to_string()),
        Just("shutting-down".to_string()),
        Just("terminated".to_string()),
        "[a-z-]{0,12}",
    ]
}

fn records() -> impl Strategy<Value = Vec<RawInstance>> {
    prop::collection::vec(
        (0u8..6, raw_state(), prop::option::of("[a-z]{1,8}")),
        0..12,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .map(|(n, state, name)| RawInstance {
                id: InstanceId::new(format!("i-{n}")),
                state,
                tags: name
                    .map(|v| BTreeMap::from([("Name".to_string(), v)]))
                    .unwrap_or_default(),
            })
            .collect()
    })
}

// ============================================================================
// map_raw_state()
// ============================================================================

proptest! {
    /// Only the three settled states map to something other than Transitioning.
    #[test]
    fn prop_unrecognised_states_are_transitioning(raw in "\\PC{0,20}") {
        let mapped = map_raw_state(&raw);
        match raw.as_str() {
            "stopped" => prop_assert_eq!(mapped, ReconciledState::Stopped),
            "running" => prop_assert_eq!(mapped, ReconciledState::Running),
            "terminated" => prop_assert_eq!(mapped, ReconciledState::Terminated),
            _ => prop_assert_eq!(mapped, ReconciledState::Transitioning),
        }
    }

    /// A control is enabled exactly when it offers an action.
    #[test]
    fn prop_disabled_iff_no_action(raw in raw_state()) {
        let state = map_raw_state(&raw);
        prop_assert_eq!(state.is_disabled(), state.action().is_none());
        prop_assert_eq!(state.is_disabled(), matches!(state, ReconciledState::Terminated | ReconciledState::Transitioning));
    }

    /// Entries always carry a reconciled state consistent with their raw state.
    #[test]
    fn prop_tracked_instance_derivation(raw in raw_state()) {
        let entry = TrackedInstance::new(InstanceId::from("i-1"), raw.clone(), BTreeMap::new());
        prop_assert_eq!(entry.reconciled(), map_raw_state(&raw));
        prop_assert_eq!(entry.is_transitioning(), entry.reconciled() == ReconciledState::Transitioning);
    }
}

// ============================================================================
// reconcile()
// ============================================================================

proptest! {
    /// Applying the same response twice never reports a second change.
    #[test]
    fn prop_reconcile_is_idempotent(first in records()) {
        let once = reconcile::reconcile(&Directory::default(), first.clone())
            .unwrap_or_default();
        prop_assert!(reconcile::reconcile(&once, first).is_none());
    }

    /// A reported change is a real difference; no change means equal data.
    #[test]
    fn prop_reconcile_reports_only_real_changes(first in records(), second in records()) {
        let base = reconcile::reconcile(&Directory::default(), first).unwrap_or_default();
        match reconcile::reconcile(&base, second.clone()) {
            Some(next) => prop_assert_ne!(&next, &base),
            None => {
                // Later records for the same ID win.
                let last: BTreeMap<InstanceId, String> =
                    second.into_iter().map(|r| (r.id, r.state)).collect();
                for (id, state) in last {
                    let entry = base.get(&id).expect("every record is in the directory");
                    prop_assert_eq!(entry.raw_state(), state.as_str());
                }
            }
        }
    }

    /// Entries are never dropped by a poll.
    #[test]
    fn prop_reconcile_never_shrinks(first in records(), second in records()) {
        let base = reconcile::reconcile(&Directory::default(), first).unwrap_or_default();
        let next = reconcile::reconcile(&base, second).unwrap_or_else(|| base.clone());
        prop_assert!(next.len() >= base.len());
        for entry in base.iter() {
            prop_assert!(next.get(entry.id()).is_some());
        }
    }

    /// A validated action always lands the entry in Transitioning.
    #[test]
    fn prop_valid_action_transitions(raw in raw_state(), start in any::<bool>()) {
        let id = InstanceId::from("i-1");
        let mut dir: Directory = [TrackedInstance::new(id.clone(), raw, BTreeMap::new())]
            .into_iter()
            .collect();
        let action = if start { Action::Start } else { Action::Stop };
        if reconcile::validate_action(&dir, &id, action).is_ok() {
            prop_assert!(reconcile::apply_optimistic(&mut dir, &id, action));
            prop_assert!(dir.get(&id).expect("entry").is_transitioning());
        }
    }
}

// ============================================================================
// Config validation
// ============================================================================

proptest! {
    #[test]
    fn prop_arbitrary_keys_rejected(key in "[a-z]{1,20}\\.[a-z_]{1,20}") {
        if !["provider.region", "provider.profile", "poll.interval_ms"].contains(&key.as_str()) {
            prop_assert!(validate_config_key(&key).is_err(), "accepted invalid key: {key}");
        }
    }

    #[test]
    fn prop_interval_range_enforced(ms in 0u64..200_000) {
        let ok = validate_config_value("poll.interval_ms", &ms.to_string()).is_ok();
        prop_assert_eq!(ok, (MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS).contains(&ms));
    }

    #[test]
    fn prop_well_formed_instance_ids_accepted(hex in "[0-9a-f]{17}") {
        let id = format!("i-{hex}");
        prop_assert!(validate_instance_id(&id).is_ok(), "rejected {}", id);
    }

    #[test]
    fn prop_malformed_instance_ids_rejected(body in "[g-z]{1,17}") {
        let id = format!("i-{body}");
        prop_assert!(validate_instance_id(&id).is_err(), "accepted {}", id);
    }
}

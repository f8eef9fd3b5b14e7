//! Unit tests for the status poller and the directory it maintains.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use switchboard_cli::application::{Engine, EngineSettings, PollOutcome};
use switchboard_cli::domain::instance::{InstanceId, ReconciledState};
use switchboard_cli::domain::POLL_FAILURE_MESSAGE;
use switchboard_common::ErrorOrigin;

use crate::mocks::{RecordingCommand, ScriptedQuery, group, named, raw};

fn engine(query: &ScriptedQuery) -> Engine<ScriptedQuery, RecordingCommand> {
    Engine::new(query.clone(), RecordingCommand::new(), EngineSettings::default())
}

fn tracked(ids: &[&str]) -> EngineSettings {
    EngineSettings {
        tracked: ids.iter().map(|id| InstanceId::from(*id)).collect(),
        ..EngineSettings::default()
    }
}

#[tokio::test]
async fn test_poll_flattens_groups_into_directory() {
    let query = ScriptedQuery::new().then_groups(vec![
        group(vec![named("i-1", "running", "web"), raw("i-2", "stopped")]),
        group(vec![raw("i-3", "pending")]),
    ]);
    let engine = engine(&query);

    assert_eq!(engine.poll().await, PollOutcome::Changed);

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.len(), 3);
    let web = snapshot.get(&InstanceId::from("i-1")).expect("i-1");
    assert_eq!(web.reconciled(), ReconciledState::Running);
    assert_eq!(web.name(), Some("web"));
    assert_eq!(
        snapshot.get(&InstanceId::from("i-3")).unwrap().reconciled(),
        ReconciledState::Transitioning
    );
    assert!(engine.error().is_none());
}

#[tokio::test]
async fn test_poll_passes_tracked_ids_in_one_batch() {
    let query = ScriptedQuery::new().then_ok(vec![raw("i-1", "running")]);
    let engine = Engine::new(query.clone(), RecordingCommand::new(), tracked(&["i-1", "i-2"]));

    engine.poll().await;

    assert_eq!(
        query.calls(),
        vec![vec![InstanceId::from("i-1"), InstanceId::from("i-2")]]
    );
}

#[tokio::test]
async fn test_poll_with_empty_tracked_set_queries_everything() {
    let query = ScriptedQuery::new().then_ok(vec![]);
    let engine = engine(&query);

    engine.poll().await;

    assert_eq!(query.calls(), vec![Vec::<InstanceId>::new()]);
}

#[tokio::test]
async fn test_identical_response_publishes_nothing() {
    let query = ScriptedQuery::new().then_ok(vec![raw("i-1", "running"), raw("i-2", "stopped")]);
    let engine = engine(&query);
    let mut rx = engine.subscribe();

    assert_eq!(engine.poll().await, PollOutcome::Changed);
    assert!(rx.has_changed().unwrap());
    let first = Arc::clone(&rx.borrow_and_update());

    assert_eq!(engine.poll().await, PollOutcome::Unchanged);
    assert_eq!(engine.poll().await, PollOutcome::Unchanged);

    assert!(!rx.has_changed().unwrap(), "no notification for equal data");
    assert!(Arc::ptr_eq(&first, &engine.snapshot()), "snapshot identity kept");
}

#[tokio::test]
async fn test_state_change_publishes_new_snapshot() {
    let query = ScriptedQuery::new()
        .then_ok(vec![raw("i-1", "stopped")])
        .then_ok(vec![raw("i-1", "pending")]);
    let engine = engine(&query);
    let mut rx = engine.subscribe();

    engine.poll().await;
    let before = Arc::clone(&rx.borrow_and_update());
    assert_eq!(engine.poll().await, PollOutcome::Changed);

    assert!(rx.has_changed().unwrap());
    let after = Arc::clone(&rx.borrow_and_update());
    assert!(!Arc::ptr_eq(&before, &after));
    let entry = after.get(&InstanceId::from("i-1")).unwrap();
    assert_eq!(entry.raw_state(), "pending");
    assert!(entry.is_transitioning());
    // The previous snapshot is untouched.
    assert_eq!(before.get(&InstanceId::from("i-1")).unwrap().raw_state(), "stopped");
}

#[tokio::test]
async fn test_tag_change_alone_is_a_change() {
    let query = ScriptedQuery::new()
        .then_ok(vec![named("i-1", "running", "web")])
        .then_ok(vec![named("i-1", "running", "web-2")]);
    let engine = engine(&query);

    engine.poll().await;
    assert_eq!(engine.poll().await, PollOutcome::Changed);
    assert_eq!(
        engine.snapshot().get(&InstanceId::from("i-1")).unwrap().name(),
        Some("web-2")
    );
}

#[tokio::test]
async fn test_instance_missing_from_response_is_kept() {
    let query = ScriptedQuery::new()
        .then_ok(vec![raw("i-1", "running"), raw("i-2", "stopped")])
        .then_ok(vec![raw("i-1", "stopping")]);
    let engine = engine(&query);

    engine.poll().await;
    engine.poll().await;

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot.get(&InstanceId::from("i-2")).unwrap().raw_state(), "stopped");
    assert_eq!(snapshot.get(&InstanceId::from("i-1")).unwrap().raw_state(), "stopping");
}

#[tokio::test]
async fn test_poll_failure_sets_fixed_message_and_keeps_directory() {
    let query = ScriptedQuery::new()
        .then_ok(vec![raw("i-1", "running")])
        .then_err("Could not connect to the endpoint URL: https://ec2.eu-west-1.amazonaws.com/");
    let engine = engine(&query);
    engine.poll().await;
    let before = engine.snapshot();
    let mut rx = engine.subscribe();

    assert_eq!(engine.poll().await, PollOutcome::Failed);

    let error = engine.error().expect("error surfaced");
    assert_eq!(error.origin, ErrorOrigin::Poll);
    assert_eq!(error.message, POLL_FAILURE_MESSAGE);
    assert!(!rx.has_changed().unwrap(), "directory not republished");
    assert!(Arc::ptr_eq(&before, &engine.snapshot()));
}

#[tokio::test]
async fn test_successful_poll_does_not_clear_error() {
    let query = ScriptedQuery::new()
        .then_err("timeout")
        .then_ok(vec![raw("i-1", "running")]);
    let engine = engine(&query);

    engine.poll().await;
    assert_eq!(engine.poll().await, PollOutcome::Changed);

    assert_eq!(engine.error().map(|e| e.origin), Some(ErrorOrigin::Poll));
    engine.dismiss_error();
    assert!(engine.error().is_none());
}

#[tokio::test]
async fn test_overlapping_poll_is_skipped() {
    let query = ScriptedQuery::new().then_ok(vec![raw("i-1", "running")]);
    let gate = query.gated();
    let engine = Arc::new(engine(&query));

    let first = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.poll().await }
    });
    gate.entered().await;

    assert_eq!(engine.poll().await, PollOutcome::Skipped);
    assert_eq!(query.call_count(), 1);

    gate.release(1);
    assert_eq!(first.await.unwrap(), PollOutcome::Changed);

    // The flag is released once the first poll completes.
    gate.release(1);
    assert_eq!(engine.poll().await, PollOutcome::Unchanged);
    assert_eq!(query.call_count(), 2);
}

#[tokio::test]
async fn test_stop_discards_in_flight_poll() {
    let query = ScriptedQuery::new().then_err("connection reset");
    let gate = query.gated();
    let engine = Arc::new(engine(&query));

    let pending = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.poll().await }
    });
    gate.entered().await;
    engine.stop().await;
    gate.release(1);

    assert_eq!(pending.await.unwrap(), PollOutcome::Discarded);
    assert!(engine.error().is_none(), "late failure not surfaced");
    assert!(engine.snapshot().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_poll_loop_ticks_on_interval_until_stopped() {
    let query = ScriptedQuery::new().then_ok(vec![raw("i-1", "running")]);
    let settings = EngineSettings {
        poll_interval: Duration::from_millis(2000),
        ..EngineSettings::default()
    };
    let engine = Engine::new(query.clone(), RecordingCommand::new(), settings);

    assert!(engine.start().await);
    assert!(!engine.start().await, "second start is a no-op");
    assert!(engine.is_running().await);

    // First tick fires immediately, then every 2s.
    tokio::time::sleep(Duration::from_millis(4100)).await;
    assert_eq!(query.call_count(), 3);
    assert_eq!(engine.snapshot().len(), 1);

    engine.stop().await;
    assert!(!engine.is_running().await);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(query.call_count(), 3, "no ticks after stop");
}

#[tokio::test(start_paused = true)]
async fn test_slow_query_skips_ticks_instead_of_queueing() {
    let query = ScriptedQuery::new().then_ok(vec![raw("i-1", "running")]);
    let gate = query.gated();
    let engine = Engine::new(query.clone(), RecordingCommand::new(), EngineSettings::default());

    engine.start().await;
    gate.entered().await;
    // Several periods pass while the first query is held open.
    tokio::time::sleep(Duration::from_millis(7000)).await;
    assert_eq!(query.call_count(), 1);

    gate.release(100);
    tokio::time::sleep(Duration::from_millis(2100)).await;
    assert!(query.call_count() <= 3, "missed ticks are not replayed");
    engine.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_drop_cancels_poll_loop() {
    let query = ScriptedQuery::new().then_ok(vec![raw("i-1", "running")]);
    let engine = engine(&query);
    engine.start().await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    let before = query.call_count();
    assert_eq!(before, 1, "first tick fires immediately");

    drop(engine);
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(query.call_count(), before, "no ticks after drop");
}

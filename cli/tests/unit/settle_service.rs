//! Unit tests for `start --wait` / `stop --wait` settling.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::time::Duration;

use switchboard_cli::application::services::settle::wait_until_settled;
use switchboard_cli::application::{DispatchOutcome, Engine, EngineSettings};
use switchboard_cli::domain::instance::{Action, InstanceId};

use crate::mocks::{RecordingCommand, RecordingReporter, ScriptedQuery, raw};

fn engine(query: &ScriptedQuery) -> Engine<ScriptedQuery, RecordingCommand> {
    Engine::new(
        query.clone(),
        RecordingCommand::new(),
        EngineSettings {
            tracked: vec![InstanceId::from("i-1")],
            poll_interval: Duration::from_millis(500),
        },
    )
}

#[tokio::test(start_paused = true)]
async fn test_wait_returns_once_target_reached() {
    let query = ScriptedQuery::new()
        .then_ok(vec![raw("i-1", "stopped")])
        .then_ok(vec![raw("i-1", "stopped")])
        .then_ok(vec![raw("i-1", "pending")])
        .then_ok(vec![raw("i-1", "running")]);
    let engine = engine(&query);
    let reporter = RecordingReporter::default();
    let id = InstanceId::from("i-1");

    engine.poll().await;
    assert_eq!(engine.dispatch(&id, Action::Start).await, DispatchOutcome::Sent);

    let settled = wait_until_settled(&engine, &id, Action::Start, Duration::from_secs(60), &reporter)
        .await
        .expect("settles");

    assert_eq!(settled.raw_state(), "running");
    assert_eq!(query.call_count(), 4);
    let steps = reporter.steps.lock().unwrap().clone();
    assert_eq!(steps, vec!["i-1: stopped", "i-1: pending", "i-1: running"]);
}

#[tokio::test(start_paused = true)]
async fn test_wait_times_out() {
    let query = ScriptedQuery::new().then_ok(vec![raw("i-1", "stopping")]);
    let engine = engine(&query);
    let id = InstanceId::from("i-1");
    engine.poll().await;

    let err = wait_until_settled(
        &engine,
        &id,
        Action::Stop,
        Duration::from_secs(3),
        &RecordingReporter::default(),
    )
    .await
    .expect_err("never settles");

    let message = err.to_string();
    assert!(message.contains("did not reach stopped"), "{message}");
    assert!(message.contains("last state: stopping"), "{message}");
}

#[tokio::test(start_paused = true)]
async fn test_wait_fails_on_termination() {
    let query = ScriptedQuery::new()
        .then_ok(vec![raw("i-1", "running")])
        .then_ok(vec![raw("i-1", "shutting-down")])
        .then_ok(vec![raw("i-1", "terminated")]);
    let engine = engine(&query);
    let id = InstanceId::from("i-1");
    engine.poll().await;

    let err = wait_until_settled(
        &engine,
        &id,
        Action::Stop,
        Duration::from_secs(60),
        &RecordingReporter::default(),
    )
    .await
    .expect_err("terminated");

    assert!(err.to_string().contains("terminated"));
}

#[tokio::test(start_paused = true)]
async fn test_wait_retries_failed_polls_with_a_warning() {
    let query = ScriptedQuery::new()
        .then_ok(vec![raw("i-1", "pending")])
        .then_err("throttled")
        .then_ok(vec![raw("i-1", "running")]);
    let engine = engine(&query);
    let reporter = RecordingReporter::default();
    let id = InstanceId::from("i-1");
    engine.poll().await;

    let settled = wait_until_settled(&engine, &id, Action::Start, Duration::from_secs(60), &reporter)
        .await
        .expect("settles");

    assert_eq!(settled.raw_state(), "running");
    assert_eq!(reporter.warnings.lock().unwrap().len(), 1);
    assert!(engine.error().is_some(), "poll error stays until dismissed");
}

#[tokio::test(start_paused = true)]
async fn test_wait_fails_when_instance_unknown() {
    let query = ScriptedQuery::new().then_ok(vec![]);
    let engine = engine(&query);

    let err = wait_until_settled(
        &engine,
        &InstanceId::from("i-1"),
        Action::Start,
        Duration::from_secs(60),
        &RecordingReporter::default(),
    )
    .await
    .expect_err("unknown instance");

    assert!(err.to_string().contains("was not found"));
}

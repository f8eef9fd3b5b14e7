//! Unit tests for the switchboard CLI
//!
//! These tests use stubbed ports and run fast without external I/O.

mod engine_poll;
mod property_tests;
mod settle_service;

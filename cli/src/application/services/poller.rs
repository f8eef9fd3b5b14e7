//! Status poller: one batched query per tick, published only on change.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use switchboard_common::ErrorOrigin;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::application::ports::InstanceQuery;
use crate::application::services::engine::Shared;
use crate::domain::error::QueryError;
use crate::domain::instance::RawInstance;
use crate::domain::reconcile;

/// Result of a single poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The directory was replaced and subscribers were notified.
    Changed,
    /// The response matched the directory; nothing was published.
    Unchanged,
    /// Another poll was still in flight; no query was made.
    Skipped,
    /// The query failed; the error surface was set, the directory untouched.
    Failed,
    /// The engine was stopped while the query was in flight.
    Discarded,
}

/// Holds the in-flight flag for the lifetime of one poll.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<Q: InstanceQuery, C> Shared<Q, C> {
    pub(crate) async fn poll(&self) -> PollOutcome {
        let Some(_in_flight) = InFlight::acquire(&self.poll_in_flight) else {
            debug!("poll still in flight, skipping tick");
            return PollOutcome::Skipped;
        };
        let epoch = self.current_epoch();

        let result = self.query.describe_instances(&self.tracked).await;

        if self.current_epoch() != epoch {
            debug!("engine stopped during poll, discarding response");
            return PollOutcome::Discarded;
        }

        match result {
            Ok(groups) => self.apply(reconcile::flatten(groups)),
            Err(e) => {
                let err = QueryError {
                    detail: format!("{e:#}"),
                };
                warn!(error = %err.detail, "instance status query failed");
                self.errors.raise(ErrorOrigin::Poll, err.to_string());
                PollOutcome::Failed
            }
        }
    }

    fn apply(&self, records: Vec<RawInstance>) -> PollOutcome {
        let count = records.len();
        let changed = self.directory.send_if_modified(|current| {
            match reconcile::reconcile(&**current, records) {
                Some(next) => {
                    *current = Arc::new(next);
                    true
                }
                None => false,
            }
        });
        if changed {
            debug!(instances = count, "directory updated");
            PollOutcome::Changed
        } else {
            trace!(instances = count, "poll unchanged");
            PollOutcome::Unchanged
        }
    }
}

/// Periodic poll loop. Runs until `cancel` fires.
///
/// Ticks that come due while a poll is still running are skipped rather than
/// queued.
pub(crate) async fn run_loop<Q, C>(
    shared: Arc<Shared<Q, C>>,
    period: Duration,
    cancel: CancellationToken,
) where
    Q: InstanceQuery,
    C: Send + Sync,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            outcome = shared.poll() => trace!(?outcome, "poll tick"),
        }
    }
    debug!("poll loop exiting");
}

//! Application service: the reconciliation engine object.
//!
//! Owns the instance directory and the error surface, and drives the poll
//! loop. Imports only from `crate::domain` and `crate::application::ports`.
//!
//! Readers get immutable [`Snapshot`]s; every replacement goes through the
//! `watch` sender, so a reader never observes a half-applied poll.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::ports::{InstanceCommand, InstanceQuery};
use crate::application::services::dispatcher::DispatchOutcome;
use crate::application::services::error_surface::{ErrorState, ErrorSurface};
use crate::application::services::poller::{self, PollOutcome};
use crate::domain::config::DEFAULT_POLL_INTERVAL_MS;
use crate::domain::instance::{Action, Directory, InstanceId, Snapshot};

/// What the engine tracks and how often it polls.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Instances to query. Empty queries everything the credentials can see.
    pub tracked: Vec<InstanceId>,
    pub poll_interval: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tracked: Vec::new(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

/// State shared between the engine handle and its poll loop task.
pub(crate) struct Shared<Q, C> {
    pub(crate) query: Q,
    pub(crate) command: C,
    pub(crate) tracked: Vec<InstanceId>,
    pub(crate) directory: watch::Sender<Snapshot>,
    pub(crate) errors: ErrorSurface,
    pub(crate) poll_in_flight: AtomicBool,
    /// Bumped by `stop()`. Calls that started under an older epoch drop
    /// their results.
    pub(crate) epoch: AtomicU64,
}

impl<Q, C> Shared<Q, C> {
    pub(crate) fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }
}

struct PollerTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// The reconciliation engine: status poller, action dispatcher, directory and
/// error surface behind one handle.
pub struct Engine<Q, C> {
    shared: Arc<Shared<Q, C>>,
    poll_interval: Duration,
    poller: Mutex<Option<PollerTask>>,
}

impl<Q: InstanceQuery, C: InstanceCommand> Engine<Q, C> {
    /// Create an engine with an empty directory. Nothing is polled until
    /// [`Engine::poll`] or [`Engine::start`] is called.
    pub fn new(query: Q, command: C, settings: EngineSettings) -> Self {
        let (directory, _) = watch::channel(Arc::new(Directory::default()));
        Self {
            shared: Arc::new(Shared {
                query,
                command,
                tracked: settings.tracked,
                directory,
                errors: ErrorSurface::new(),
                poll_in_flight: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
            }),
            poll_interval: settings.poll_interval,
            poller: Mutex::new(None),
        }
    }

    /// Run one poll tick now.
    pub async fn poll(&self) -> PollOutcome {
        self.shared.poll().await
    }

    /// Issue a start/stop command for one instance.
    pub async fn dispatch(&self, id: &InstanceId, action: Action) -> DispatchOutcome {
        self.shared.dispatch(id, action).await
    }

    /// The current directory snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.shared.directory.borrow().clone()
    }

    /// Receiver that wakes only when the directory really changed.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.shared.directory.subscribe()
    }

    #[must_use]
    pub fn error(&self) -> Option<ErrorState> {
        self.shared.errors.current()
    }

    #[must_use]
    pub fn subscribe_errors(&self) -> watch::Receiver<Option<ErrorState>> {
        self.shared.errors.subscribe()
    }

    pub fn dismiss_error(&self) {
        self.shared.errors.dismiss();
    }

    #[must_use]
    pub fn tracked(&self) -> &[InstanceId] {
        &self.shared.tracked
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

impl<Q, C> Engine<Q, C>
where
    Q: InstanceQuery + 'static,
    C: InstanceCommand + 'static,
{
    /// Start the periodic poll loop. The first tick fires immediately.
    ///
    /// Returns `false` if the loop was already running.
    pub async fn start(&self) -> bool {
        let mut slot = self.poller.lock().await;
        if slot.is_some() {
            warn!("poll loop already running");
            return false;
        }
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poller::run_loop(
            Arc::clone(&self.shared),
            self.poll_interval,
            cancel.clone(),
        ));
        *slot = Some(PollerTask { cancel, handle });
        info!(
            interval_ms = u64::try_from(self.poll_interval.as_millis()).unwrap_or(u64::MAX),
            tracked = self.shared.tracked.len(),
            "poll loop started"
        );
        true
    }

    /// Stop the poll loop.
    ///
    /// The timer is cancelled and the loop task has exited by the time this
    /// returns. Port calls that are still in flight elsewhere, including
    /// manual [`Engine::poll`] and [`Engine::dispatch`] calls, complete as
    /// no-ops.
    pub async fn stop(&self) {
        self.shared.epoch.fetch_add(1, Ordering::AcqRel);
        let Some(task) = self.poller.lock().await.take() else {
            debug!("poll loop not running");
            return;
        };
        task.cancel.cancel();
        if let Err(e) = task.handle.await
            && e.is_panic()
        {
            warn!(error = %e, "poll loop panicked");
        }
        info!("poll loop stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.poller.lock().await.is_some()
    }
}

impl<Q, C> Drop for Engine<Q, C> {
    fn drop(&mut self) {
        if let Some(task) = self.poller.get_mut().take() {
            self.shared.epoch.fetch_add(1, Ordering::AcqRel);
            task.cancel.cancel();
            task.handle.abort();
        }
    }
}

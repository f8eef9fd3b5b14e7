//! Single-slot, user-dismissible error channel.
//!
//! Last write wins; there is no queue. Only [`ErrorSurface::dismiss`] clears
//! the slot, so a later successful poll leaves a command error in place.

use chrono::{DateTime, Utc};
use switchboard_common::{ErrorOrigin, ErrorReport};
use tokio::sync::watch;

/// The active error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorState {
    pub origin: ErrorOrigin,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl ErrorState {
    #[must_use]
    pub fn to_report(&self) -> ErrorReport {
        ErrorReport {
            origin: self.origin,
            message: self.message.clone(),
            raised_at: self.raised_at,
        }
    }
}

pub struct ErrorSurface {
    slot: watch::Sender<Option<ErrorState>>,
}

impl ErrorSurface {
    #[must_use]
    pub fn new() -> Self {
        let (slot, _) = watch::channel(None);
        Self { slot }
    }

    /// Overwrite the slot with a new error.
    pub fn raise(&self, origin: ErrorOrigin, message: impl Into<String>) {
        self.slot.send_replace(Some(ErrorState {
            origin,
            message: message.into(),
            raised_at: Utc::now(),
        }));
    }

    /// Clear the slot. Subscribers are only woken if there was an error.
    pub fn dismiss(&self) {
        self.slot.send_if_modified(|slot| slot.take().is_some());
    }

    #[must_use]
    pub fn current(&self) -> Option<ErrorState> {
        self.slot.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<ErrorState>> {
        self.slot.subscribe()
    }
}

impl Default for ErrorSurface {
    fn default() -> Self {
        Self::new()
    }
}

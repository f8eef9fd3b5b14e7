//! Action dispatcher: validate, transition optimistically, then command.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::sync::Arc;

use switchboard_common::ErrorOrigin;
use tracing::{debug, info, warn};

use crate::application::ports::InstanceCommand;
use crate::application::services::engine::Shared;
use crate::domain::error::{CommandError, ValidationError};
use crate::domain::instance::{Action, InstanceId};
use crate::domain::reconcile;

/// Result of a dispatch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The provider accepted the command. The next poll reconciles the
    /// final state.
    Sent,
    /// The request did not match the instance's current control; nothing
    /// was sent and nothing was surfaced.
    Ignored(ValidationError),
    /// The provider rejected the command. The error surface carries the
    /// message and the optimistic transition stays in place.
    Failed(CommandError),
}

impl<Q, C: InstanceCommand> Shared<Q, C> {
    pub(crate) async fn dispatch(&self, id: &InstanceId, action: Action) -> DispatchOutcome {
        // Validate and transition under one write so a concurrent poll cannot
        // slip in between.
        let mut rejected = None;
        self.directory.send_if_modified(|current| {
            if let Err(e) = reconcile::validate_action(current, id, action) {
                rejected = Some(e);
                return false;
            }
            let mut next = (**current).clone();
            reconcile::apply_optimistic(&mut next, id, action);
            *current = Arc::new(next);
            true
        });
        if let Some(reason) = rejected {
            debug!(instance_id = %id, %action, %reason, "ignoring stale command");
            return DispatchOutcome::Ignored(reason);
        }

        let epoch = self.current_epoch();
        let ids = std::slice::from_ref(id);
        let result = match action {
            Action::Start => self.command.start_instances(ids).await,
            Action::Stop => self.command.stop_instances(ids).await,
        };

        match result {
            Ok(ack) => {
                info!(instance_id = %id, %action, reported = ?ack.current_states, "command accepted");
                DispatchOutcome::Sent
            }
            Err(e) => {
                let err = CommandError {
                    instance_id: id.clone(),
                    action,
                    message: e.to_string(),
                };
                if self.current_epoch() == epoch {
                    warn!(instance_id = %id, %action, error = %format!("{e:#}"), "command failed");
                    self.errors.raise(ErrorOrigin::Command, err.message.clone());
                } else {
                    debug!(instance_id = %id, %action, "engine stopped, dropping command failure");
                }
                DispatchOutcome::Failed(err)
            }
        }
    }
}

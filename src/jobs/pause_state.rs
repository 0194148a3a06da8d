use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::storage::{keys, Storage, StorageError};

const PAUSED: &str = "true";
const RESUMED: &str = "false";

/// Pause flag of a job, derived from the members of its `pause-state:<name>` set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseState {
    /// No member recorded yet. Behaves like `Resumed`.
    Unset,
    Paused,
    Resumed,
}

impl PauseState {
    fn from_members(members: &BTreeSet<String>) -> Self {
        if members.contains(PAUSED) {
            Self::Paused
        } else if members.contains(RESUMED) {
            Self::Resumed
        } else {
            Self::Unset
        }
    }

    #[must_use]
    pub const fn is_paused(self) -> bool {
        matches!(self, Self::Paused)
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Paused => Self::Resumed,
            Self::Unset | Self::Resumed => Self::Paused,
        }
    }
}

/// Projection returned when listing paused jobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringJobSummary {
    pub id: String,
}

#[derive(Clone, Debug)]
pub struct PauseStateStore {
    storage: Storage,
}

impl PauseStateStore {
    pub const fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub async fn state(&self, job_name: &str) -> Result<PauseState, StorageError> {
        let members = self.storage.set_members(&keys::pause_state(job_name)).await?;
        Ok(PauseState::from_members(&members))
    }

    pub async fn is_paused(&self, job_name: &str) -> Result<bool, StorageError> {
        Ok(self.state(job_name).await?.is_paused())
    }

    /// Flips the pause flag and returns the state after the flip.
    ///
    /// The opposite member is removed before the new one is added, so at most
    /// one of `"true"`/`"false"` remains once the transaction commits.
    /// Concurrent toggles of the same job rely on the storage's isolation.
    #[instrument(skip(self))]
    pub async fn toggle(&self, job_name: &str) -> Result<PauseState, StorageError> {
        let key = keys::pause_state(job_name);
        let next = self.state(job_name).await?.toggled();
        let (stale, fresh) = if next.is_paused() {
            (RESUMED, PAUSED)
        } else {
            (PAUSED, RESUMED)
        };

        let mut transaction = self.storage.write_transaction();
        transaction.remove_from_set(&key, stale).add_to_set(&key, fresh);
        transaction.commit().await?;

        info!(paused = next.is_paused(), "⏯️ Toggled pause state of '{}'", job_name);
        Ok(next)
    }

    /// Recurring jobs whose pause flag is currently set.
    ///
    /// Scans the whole recurring job catalog on every call.
    pub async fn list_paused(&self) -> Result<Vec<RecurringJobSummary>, StorageError> {
        let mut paused = Vec::new();

        for id in self.storage.recurring_job_ids().await? {
            if self.is_paused(&id).await? {
                paused.push(RecurringJobSummary { id });
            }
        }

        debug!("{} paused recurring job(s)", paused.len());
        Ok(paused)
    }
}

//! Durable hash/set store that job records and pause flags live in.
//!
//! The store exposes only hash and set primitives. Reads go straight to the
//! backend; writes are queued on a [`WriteTransaction`] and applied atomically
//! on commit.

mod database_storage;
mod memory_storage;
mod write_transaction;

use std::collections::{BTreeMap, BTreeSet};

use sea_orm::DatabaseConnection;
use thiserror::Error;

pub use memory_storage::MemoryStorage;
pub use write_transaction::{WriteCommand, WriteTransaction};

/// Key conventions shared by everything that reads or writes the store
pub mod keys {
    /// Set holding the identifiers of every recurring job
    pub const RECURRING_JOBS: &str = "recurring-jobs";

    /// Set holding the identifiers of scheduled one-off jobs
    pub const SCHEDULE: &str = "schedule";

    /// Field of a job hash that carries the serialized invocation
    pub const JOB_FIELD: &str = "Job";

    #[must_use]
    pub fn recurring_job(job_name: &str) -> String {
        format!("recurring-job:{job_name}")
    }

    #[must_use]
    pub fn job(job_id: &str) -> String {
        format!("job:{job_id}")
    }

    #[must_use]
    pub fn pause_state(job_name: &str) -> String {
        format!("pause-state:{job_name}")
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(#[from] sea_orm::DbErr),
}

/// Handle to the job store. Cheap to clone; every clone talks to the same backend.
#[derive(Clone, Debug)]
pub enum Storage {
    /// Tables managed through `sea-orm`
    Database(DatabaseConnection),
    /// Process-local store, used by tests and the `memory` storage configuration
    Memory(MemoryStorage),
}

impl Storage {
    pub fn memory() -> Self {
        Self::Memory(MemoryStorage::new())
    }

    pub const fn database(db: DatabaseConnection) -> Self {
        Self::Database(db)
    }

    /// All field/value pairs of a hash. Absent hashes read as empty.
    pub async fn hash_entries(&self, key: &str) -> Result<BTreeMap<String, String>, StorageError> {
        match self {
            Self::Database(db) => database_storage::hash_entries(db, key).await,
            Self::Memory(memory) => Ok(memory.hash_entries(key).await),
        }
    }

    /// All members of a set. Absent sets read as empty.
    pub async fn set_members(&self, key: &str) -> Result<BTreeSet<String>, StorageError> {
        match self {
            Self::Database(db) => database_storage::set_members(db, key).await,
            Self::Memory(memory) => Ok(memory.set_members(key).await),
        }
    }

    /// Identifiers of every recurring job known to the scheduler
    pub async fn recurring_job_ids(&self) -> Result<Vec<String>, StorageError> {
        Ok(self
            .set_members(keys::RECURRING_JOBS)
            .await?
            .into_iter()
            .collect())
    }

    pub fn write_transaction(&self) -> WriteTransaction<'_> {
        WriteTransaction::new(self)
    }

    pub async fn ping(&self) -> Result<(), StorageError> {
        match self {
            Self::Database(db) => Ok(db.ping().await?),
            Self::Memory(_) => Ok(()),
        }
    }

    pub(crate) async fn apply(&self, commands: Vec<WriteCommand>) -> Result<(), StorageError> {
        match self {
            Self::Database(db) => database_storage::apply(db, commands).await,
            Self::Memory(memory) => {
                memory.apply(commands).await;
                Ok(())
            }
        }
    }
}

use tracing::trace;

use super::{Storage, StorageError};

/// A single queued mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteCommand {
    AddToSet {
        key: String,
        value: String,
    },
    RemoveFromSet {
        key: String,
        value: String,
    },
    SetRangeInHash {
        key: String,
        entries: Vec<(String, String)>,
    },
}

/// Collects writes and applies them in one atomic step.
///
/// Nothing reaches the store until [`WriteTransaction::commit`] is awaited;
/// dropping an uncommitted transaction discards the queued commands.
#[must_use = "a write transaction does nothing until committed"]
#[derive(Debug)]
pub struct WriteTransaction<'a> {
    storage: &'a Storage,
    commands: Vec<WriteCommand>,
}

impl<'a> WriteTransaction<'a> {
    pub(super) const fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            commands: Vec::new(),
        }
    }

    pub fn add_to_set(&mut self, key: &str, value: &str) -> &mut Self {
        self.commands.push(WriteCommand::AddToSet {
            key: key.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn remove_from_set(&mut self, key: &str, value: &str) -> &mut Self {
        self.commands.push(WriteCommand::RemoveFromSet {
            key: key.to_string(),
            value: value.to_string(),
        });
        self
    }

    /// Upserts each field of the hash, leaving fields not mentioned untouched
    pub fn set_range_in_hash<K, V>(
        &mut self,
        key: &str,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.commands.push(WriteCommand::SetRangeInHash {
            key: key.to_string(),
            entries: entries
                .into_iter()
                .map(|(field, value)| (field.into(), value.into()))
                .collect(),
        });
        self
    }

    #[cfg(test)]
    pub(crate) fn commands(&self) -> &[WriteCommand] {
        &self.commands
    }

    pub async fn commit(self) -> Result<(), StorageError> {
        trace!("Committing {} storage command(s)", self.commands.len());
        self.storage.apply(self.commands).await
    }
}

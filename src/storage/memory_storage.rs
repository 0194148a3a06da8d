use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::Arc,
};

use tokio::sync::Mutex;

use super::WriteCommand;

#[derive(Debug, Default)]
struct MemoryState {
    hashes: HashMap<String, BTreeMap<String, String>>,
    sets: HashMap<String, BTreeSet<String>>,
}

/// In-memory store that keeps hashes and sets behind a single lock.
///
/// Every committed batch of commands runs under that lock, so a transaction
/// is observed either entirely or not at all.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn hash_entries(&self, key: &str) -> BTreeMap<String, String> {
        self.state
            .lock()
            .await
            .hashes
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn set_members(&self, key: &str) -> BTreeSet<String> {
        self.state
            .lock()
            .await
            .sets
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    pub(super) async fn apply(&self, commands: Vec<WriteCommand>) {
        let mut state = self.state.lock().await;

        for command in commands {
            match command {
                WriteCommand::AddToSet { key, value } => {
                    state.sets.entry(key).or_default().insert(value);
                }
                WriteCommand::RemoveFromSet { key, value } => {
                    if let Some(set) = state.sets.get_mut(&key) {
                        set.remove(&value);
                        if set.is_empty() {
                            state.sets.remove(&key);
                        }
                    }
                }
                WriteCommand::SetRangeInHash { key, entries } => {
                    state.hashes.entry(key).or_default().extend(entries);
                }
            }
        }
    }
}

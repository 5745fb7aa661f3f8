//! Append-only dialogue history

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::memory::KvStore;
use crate::Result;

const STORE_KEY: &str = "history";

/// One user/companion exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueTurn {
    /// Unique turn identifier
    pub id: Uuid,
    /// What the user said
    pub input: String,
    /// What the companion answered
    pub response: String,
    /// When the exchange happened
    pub timestamp: chrono::DateTime<chrono::Local>,
}

/// Full persisted conversation log
pub struct DialogueHistory {
    store: KvStore,
    turns: Vec<DialogueTurn>,
}

impl DialogueHistory {
    /// Load the history from the store
    ///
    /// # Errors
    ///
    /// Returns error if persisted state cannot be read
    pub fn load(store: KvStore) -> Result<Self> {
        let turns = store.load(STORE_KEY)?.unwrap_or_default();
        Ok(Self { store, turns })
    }

    /// Append one exchange
    ///
    /// # Errors
    ///
    /// Returns error if the updated log cannot be persisted
    pub fn append(&mut self, input: &str, response: &str) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.turns.push(DialogueTurn {
            id,
            input: input.to_string(),
            response: response.to_string(),
            timestamp: chrono::Local::now(),
        });
        self.store.save(STORE_KEY, &self.turns)?;
        Ok(id)
    }

    /// Number of recorded turns
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether any turns have been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Most recent turn, if any
    #[must_use]
    pub fn last(&self) -> Option<&DialogueTurn> {
        self.turns.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::open(dir.path()).unwrap();

        let mut history = DialogueHistory::load(store.clone()).unwrap();
        history.append("hello there", "hello to you too").unwrap();
        history.append("how are you", "doing well").unwrap();
        assert_eq!(history.len(), 2);

        let reloaded = DialogueHistory::load(store).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.last().unwrap().response, "doing well");
    }
}

//! Explicit remembered items
//!
//! "Remember that ..." requests land here verbatim, timestamped, and can be
//! recalled on demand.

use serde::{Deserialize, Serialize};

use crate::memory::KvStore;
use crate::Result;

const STORE_KEY: &str = "goals";
const RECALL_LIMIT: usize = 5;

/// One remembered item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    /// What the user asked to remember
    pub text: String,
    /// When it was recorded
    pub time: chrono::DateTime<chrono::Local>,
}

/// Remember-and-recall list backed by the key-value store
pub struct GoalBook {
    store: KvStore,
    goals: Vec<Goal>,
}

impl GoalBook {
    /// Load the goal book from the store
    ///
    /// # Errors
    ///
    /// Returns error if persisted state cannot be read
    pub fn load(store: KvStore) -> Result<Self> {
        let goals = store.load(STORE_KEY)?.unwrap_or_default();
        Ok(Self { store, goals })
    }

    /// Record a new item and return the spoken confirmation
    ///
    /// A failed save is logged; the confirmation still goes back to the
    /// user and the item stays in memory for the life of the process.
    pub fn remember(&mut self, text: &str) -> String {
        self.goals.push(Goal {
            text: text.trim().to_string(),
            time: chrono::Local::now(),
        });
        if let Err(e) = self.store.save(STORE_KEY, &self.goals) {
            tracing::warn!(error = %e, "failed to persist remembered item");
        }
        tracing::debug!(total = self.goals.len(), "remembered item");
        "Okay, I'll remember that for you.".to_string()
    }

    /// Spoken recall of the most recent items
    #[must_use]
    pub fn recall(&self) -> String {
        if self.goals.is_empty() {
            return "You haven't asked me to remember anything yet.".to_string();
        }

        let recent: Vec<&str> = self
            .goals
            .iter()
            .rev()
            .take(RECALL_LIMIT)
            .map(|g| g.text.as_str())
            .collect();

        format!("Here's what you asked me to remember: {}.", recent.join("; "))
    }

    /// Number of remembered items
    #[must_use]
    pub fn len(&self) -> usize {
        self.goals.len()
    }

    /// Whether anything has been remembered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> GoalBook {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::open(dir.path()).unwrap();
        GoalBook::load(store).unwrap()
    }

    #[test]
    fn test_remember_and_recall() {
        let mut book = book();
        let ack = book.remember("water the plants on Sunday");
        assert_eq!(ack, "Okay, I'll remember that for you.");

        let recall = book.recall();
        assert!(recall.contains("water the plants on Sunday"));
    }

    #[test]
    fn test_ack_survives_save_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::open(dir.path()).unwrap();
        let mut book = GoalBook::load(store).unwrap();

        // A directory squatting on the backing file makes every save fail
        std::fs::create_dir_all(dir.path().join("goals.json")).unwrap();

        let ack = book.remember("rotate the tires");
        assert_eq!(ack, "Okay, I'll remember that for you.");
        assert!(book.recall().contains("rotate the tires"));
    }

    #[test]
    fn test_empty_recall() {
        let book = book();
        assert_eq!(
            book.recall(),
            "You haven't asked me to remember anything yet."
        );
    }

    #[test]
    fn test_recall_caps_at_recent_five() {
        let mut book = book();
        for i in 0..8 {
            book.remember(&format!("item {i}"));
        }
        let recall = book.recall();
        assert!(recall.contains("item 7"));
        assert!(!recall.contains("item 1"));
    }
}

//! Private journal
//!
//! Occasional first-person reflections written via the generator, capped
//! and persisted. A small chance per turn surfaces an old thought back
//! into conversation.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::llm::Generator;
use crate::memory::KvStore;
use crate::Result;

const STORE_KEY: &str = "journal";
const MAX_ENTRIES: usize = 50;
const SURFACE_CHANCE: f64 = 0.02;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct JournalEntry {
    time: chrono::DateTime<chrono::Local>,
    thought: String,
}

/// The companion's private reflections
pub struct Journal {
    store: KvStore,
    entries: Vec<JournalEntry>,
}

impl Journal {
    /// Load the journal from the store
    ///
    /// # Errors
    ///
    /// Returns error if persisted state cannot be read
    pub fn load(store: KvStore) -> Result<Self> {
        let entries = store.load(STORE_KEY)?.unwrap_or_default();
        Ok(Self { store, entries })
    }

    /// Generate and store a reflection about something just said
    ///
    /// # Errors
    ///
    /// Returns error if generation or persistence fails
    pub async fn reflect(&mut self, generator: &dyn Generator, prompt: &str) -> Result<()> {
        let thought = generator
            .generate("You are writing one private journal sentence.", prompt)
            .await?;
        if thought.trim().is_empty() {
            return Ok(());
        }

        self.entries.push(JournalEntry {
            time: chrono::Local::now(),
            thought: thought.trim().to_string(),
        });
        if self.entries.len() > MAX_ENTRIES {
            let excess = self.entries.len() - MAX_ENTRIES;
            self.entries.drain(..excess);
        }

        tracing::debug!(entries = self.entries.len(), "journal reflection stored");
        self.store.save(STORE_KEY, &self.entries)
    }

    /// A random past thought, spoken
    #[must_use]
    pub fn share_random_thought(&self) -> String {
        match self.entries.choose(&mut rand::thread_rng()) {
            Some(entry) => format!("I wrote this down a while ago: {}", entry.thought),
            None => "I haven't written anything down lately. My mind's been quiet.".to_string(),
        }
    }

    /// Occasionally return an old thought to weave into conversation
    #[must_use]
    pub fn maybe_surface(&self) -> Option<String> {
        if self.entries.is_empty() || !rand::thread_rng().gen_bool(SURFACE_CHANCE) {
            return None;
        }
        self.entries
            .choose(&mut rand::thread_rng())
            .map(|e| e.thought.clone())
    }

    /// Number of stored entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the journal has any entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedGenerator(String);

    #[async_trait]
    impl Generator for FixedGenerator {
        async fn generate(&self, _system: &str, _user: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    fn journal() -> (tempfile::TempDir, Journal) {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::open(dir.path()).unwrap();
        let journal = Journal::load(store).unwrap();
        (dir, journal)
    }

    #[tokio::test]
    async fn test_reflect_stores_thought() {
        let (_dir, mut j) = journal();
        let gen = FixedGenerator("That exchange made me feel lighter.".to_string());
        j.reflect(&gen, "reflect on this").await.unwrap();

        assert_eq!(j.len(), 1);
        assert!(j.share_random_thought().contains("lighter"));
    }

    #[tokio::test]
    async fn test_empty_generation_is_skipped() {
        let (_dir, mut j) = journal();
        let gen = FixedGenerator("   ".to_string());
        j.reflect(&gen, "reflect on this").await.unwrap();
        assert!(j.is_empty());
    }

    #[test]
    fn test_empty_journal_share() {
        let (_dir, j) = journal();
        assert!(j.share_random_thought().contains("quiet"));
    }
}

//! Emotional moments
//!
//! A small sample of exchanges is kept as "moments" with a feeling
//! attached. Some feelings mark growth events that get tagged and can be
//! surfaced back into conversation later.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::memory::KvStore;
use crate::Result;

const STORE_KEY: &str = "emotional_moments";
const RECORD_CHANCE: f64 = 0.10;
const MAX_MOMENTS: usize = 50;

const FEELINGS: [&str; 6] = ["warm", "joyful", "grateful", "hopeful", "loved", "amused"];

/// Feelings that mark a growth event, with the tag recorded for them
const GROWTH_TAGS: [(&str, &str); 3] = [
    ("grateful", "gratitude"),
    ("hopeful", "hope"),
    ("loved", "connection"),
];

/// One remembered exchange with an attached feeling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionalMoment {
    /// When the moment happened
    pub time: chrono::DateTime<chrono::Local>,
    /// What the user said
    pub input: String,
    /// What the companion answered
    pub response: String,
    /// The feeling attached to the moment
    pub feeling: String,
    /// Growth tag, present only for growth feelings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// Sampled store of emotionally-colored exchanges
pub struct EmotionalMemory {
    store: KvStore,
    moments: Vec<EmotionalMoment>,
}

impl EmotionalMemory {
    /// Load emotional memory from the store
    ///
    /// # Errors
    ///
    /// Returns error if persisted state cannot be read
    pub fn load(store: KvStore) -> Result<Self> {
        let moments = store.load(STORE_KEY)?.unwrap_or_default();
        Ok(Self { store, moments })
    }

    /// Maybe record this exchange as a moment (sampled, roughly one in ten)
    ///
    /// # Errors
    ///
    /// Returns error if the updated list cannot be persisted
    pub fn maybe_record(&mut self, input: &str, response: &str) -> Result<()> {
        if !rand::thread_rng().gen_bool(RECORD_CHANCE) {
            return Ok(());
        }
        self.record(input, response)
    }

    /// Record this exchange unconditionally
    ///
    /// # Errors
    ///
    /// Returns error if the updated list cannot be persisted
    pub fn record(&mut self, input: &str, response: &str) -> Result<()> {
        let feeling = FEELINGS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or("warm");
        let tag = GROWTH_TAGS
            .iter()
            .find(|(f, _)| *f == feeling)
            .map(|(_, tag)| (*tag).to_string());

        if let Some(tag) = &tag {
            tracing::debug!(feeling, tag = %tag, "growth moment recorded");
        }

        self.moments.push(EmotionalMoment {
            time: chrono::Local::now(),
            input: input.to_string(),
            response: response.to_string(),
            feeling: feeling.to_string(),
            tag,
        });

        if self.moments.len() > MAX_MOMENTS {
            let excess = self.moments.len() - MAX_MOMENTS;
            self.moments.drain(..excess);
        }

        self.store.save(STORE_KEY, &self.moments)
    }

    /// A random remembered moment, spoken
    #[must_use]
    pub fn share_random(&self) -> String {
        match self.moments.choose(&mut rand::thread_rng()) {
            Some(moment) => format!(
                "I remember when you said \"{}\". It made me feel {}.",
                moment.input, moment.feeling
            ),
            None => "We haven't made any special memories yet, but I'm looking forward to them."
                .to_string(),
        }
    }

    /// Most recent growth-tagged moment, for prompt context
    #[must_use]
    pub fn latest_tagged(&self) -> Option<String> {
        self.moments
            .iter()
            .rev()
            .find(|m| m.tag.is_some())
            .map(|m| format!("{} (it felt {})", m.input, m.feeling))
    }

    /// Number of stored moments
    #[must_use]
    pub fn len(&self) -> usize {
        self.moments.len()
    }

    /// Whether any moments have been stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> (tempfile::TempDir, EmotionalMemory) {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::open(dir.path()).unwrap();
        let mem = EmotionalMemory::load(store).unwrap();
        (dir, mem)
    }

    #[test]
    fn test_record_and_share() {
        let (_dir, mut mem) = memory();
        mem.record("we stayed up talking", "I loved that too").unwrap();
        assert_eq!(mem.len(), 1);
        assert!(mem.share_random().contains("we stayed up talking"));
    }

    #[test]
    fn test_share_with_no_moments() {
        let (_dir, mem) = memory();
        assert!(mem.share_random().contains("haven't made any special memories"));
    }

    #[test]
    fn test_cap_keeps_newest() {
        let (_dir, mut mem) = memory();
        for i in 0..(MAX_MOMENTS + 10) {
            mem.record(&format!("moment {i}"), "noted").unwrap();
        }
        assert_eq!(mem.len(), MAX_MOMENTS);
        assert!(mem
            .moments
            .iter()
            .any(|m| m.input == format!("moment {}", MAX_MOMENTS + 9)));
        assert!(!mem.moments.iter().any(|m| m.input == "moment 0"));
    }
}

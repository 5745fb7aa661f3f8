//! Passive preference learning
//!
//! Every utterance is scanned for sentiment about a known category. Likes
//! and dislikes are mutually exclusive per item: learning one evicts the
//! other.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::memory::KvStore;
use crate::Result;

const STORE_KEY: &str = "preferences";

const POSITIVE_WORDS: [&str; 7] = ["love", "like", "enjoy", "awesome", "amazing", "great", "fun"];
const NEGATIVE_WORDS: [&str; 6] = ["hate", "dislike", "boring", "bad", "awful", "terrible"];

/// Leading question words; questions express curiosity, not preference
const QUESTION_STARTS: [&str; 9] = [
    "what", "how", "why", "when", "where", "do you", "would you", "could you", "can you",
];

const CATEGORIES: [(&str, &[&str]); 3] = [
    (
        "movies",
        &["movie", "movies", "film", "films", "cinema", "watch"],
    ),
    (
        "music",
        &["music", "song", "songs", "album", "band", "listen"],
    ),
    ("games", &["game", "games", "gaming", "play", "played"]),
];

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct CategoryPrefs {
    likes: Vec<String>,
    dislikes: Vec<String>,
}

/// Learns liked and disliked topics from conversation
pub struct PreferenceTracker {
    store: KvStore,
    prefs: BTreeMap<String, CategoryPrefs>,
}

impl PreferenceTracker {
    /// Load preferences from the store
    ///
    /// # Errors
    ///
    /// Returns error if persisted state cannot be read
    pub fn load(store: KvStore) -> Result<Self> {
        let prefs = store.load(STORE_KEY)?.unwrap_or_default();
        Ok(Self { store, prefs })
    }

    /// Scan one utterance for preference signals and persist any learning
    ///
    /// # Errors
    ///
    /// Returns error if updated preferences cannot be persisted
    pub fn observe(&mut self, input: &str) -> Result<()> {
        let lower = input.to_lowercase();
        let trimmed = lower.trim();

        // Questions about a topic say nothing about taste
        if trimmed.ends_with('?') || QUESTION_STARTS.iter().any(|q| trimmed.starts_with(q)) {
            return Ok(());
        }

        let positive = POSITIVE_WORDS.iter().any(|w| contains_word(trimmed, w));
        let negative = NEGATIVE_WORDS.iter().any(|w| contains_word(trimmed, w));
        if positive == negative {
            return Ok(());
        }

        let mut changed = false;
        for (category, keywords) in CATEGORIES {
            if !keywords.iter().any(|k| contains_word(trimmed, k)) {
                continue;
            }

            let entry = self.prefs.entry(category.to_string()).or_default();
            let item = trimmed.to_string();
            let (into, out_of) = if positive {
                (&mut entry.likes, &mut entry.dislikes)
            } else {
                (&mut entry.dislikes, &mut entry.likes)
            };

            out_of.retain(|existing| existing != &item);
            if !into.contains(&item) {
                into.push(item);
                changed = true;
                tracing::debug!(category, positive, "learned a preference");
            }
        }

        if changed {
            self.store.save(STORE_KEY, &self.prefs)?;
        }
        Ok(())
    }

    /// Spoken summary of everything learned so far
    #[must_use]
    pub fn summarize(&self) -> String {
        let mut parts = Vec::new();
        for (category, prefs) in &self.prefs {
            if !prefs.likes.is_empty() {
                parts.push(format!(
                    "you seem to enjoy {} ({} things noted)",
                    category,
                    prefs.likes.len()
                ));
            }
            if !prefs.dislikes.is_empty() {
                parts.push(format!(
                    "you're not fond of some {} ({} things noted)",
                    category,
                    prefs.dislikes.len()
                ));
            }
        }

        if parts.is_empty() {
            "I haven't picked up on your tastes yet, but I'm paying attention.".to_string()
        } else {
            format!("From what I've noticed, {}.", parts.join(", and "))
        }
    }

    /// Whether a category has any recorded likes
    #[must_use]
    pub fn likes_something_in(&self, category: &str) -> bool {
        self.prefs
            .get(category)
            .is_some_and(|p| !p.likes.is_empty())
    }
}

fn contains_word(haystack: &str, word: &str) -> bool {
    haystack
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| token == word)
        || (word.contains(' ') && haystack.contains(word))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> (tempfile::TempDir, PreferenceTracker) {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::open(dir.path()).unwrap();
        let tracker = PreferenceTracker::load(store).unwrap();
        (dir, tracker)
    }

    #[test]
    fn test_learns_a_like() {
        let (_dir, mut t) = tracker();
        t.observe("I really love this jazz album").unwrap();
        assert!(t.likes_something_in("music"));
        assert!(t.summarize().contains("music"));
    }

    #[test]
    fn test_questions_are_ignored() {
        let (_dir, mut t) = tracker();
        t.observe("do you like this movie").unwrap();
        t.observe("what music is fun?").unwrap();
        assert!(t.summarize().contains("haven't picked up"));
    }

    #[test]
    fn test_dislike_evicts_like() {
        let (_dir, mut t) = tracker();
        t.observe("I love this game").unwrap();
        assert!(t.likes_something_in("games"));

        t.observe("I love this game".replace("love", "hate").as_str())
            .unwrap();
        assert!(!t.likes_something_in("games"));
    }

    #[test]
    fn test_mixed_sentiment_is_skipped() {
        let (_dir, mut t) = tracker();
        t.observe("I love and hate this movie").unwrap();
        assert!(t.summarize().contains("haven't picked up"));
    }
}

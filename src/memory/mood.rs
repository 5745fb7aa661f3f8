//! Mood and tone state
//!
//! Keyword triggers shift the companion's emotion immediately; tone adjusts
//! from the user's phrasing and occasionally drifts on its own. The current
//! tone is mirrored into a shared label so the speech consumer picks the
//! matching synthesis profile.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::memory::KvStore;
use crate::voice::SharedMoodLabel;

const STORE_KEY: &str = "mood";
const DRIFT_CHANCE: f64 = 0.10;
const DRIFT_TONES: [&str; 3] = ["playful", "soft", "thoughtful"];

/// (emotion, trigger keywords) pairs, checked in order; first match wins
const EMOTION_TRIGGERS: [(&str, &[&str]); 7] = [
    ("flustered", &["cute", "pretty", "beautiful", "adorable"]),
    ("hurt", &["stupid", "useless", "shut up", "annoying"]),
    ("surprised", &["wow", "whoa", "no way", "really"]),
    ("proud", &["good job", "well done", "proud of you", "you did it"]),
    ("comforting", &["sad", "tired", "lonely", "rough day", "exhausted"]),
    ("shy", &["love you", "miss you", "thinking of you"]),
    ("annoyed", &["whatever", "nevermind", "forget it"]),
];

/// Tone shifts keyed on the user's phrasing
const TONE_SHIFTS: [(&str, &[&str]); 4] = [
    ("playful", &["joke", "funny", "play", "game", "haha", "lol"]),
    ("soft", &["quiet", "calm", "gentle", "rest", "sleep"]),
    ("serious", &["important", "serious", "focus", "listen"]),
    ("affectionate", &["sweet", "dear", "warm", "cozy"]),
];

#[derive(Serialize, Deserialize)]
struct PersistedMood {
    emotion: String,
    tone: String,
}

/// Current emotion and speaking tone
pub struct MoodState {
    emotion: String,
    tone: String,
    shared: SharedMoodLabel,
    store: Option<KvStore>,
}

impl MoodState {
    /// Create a neutral, unpersisted mood synced to the shared label
    #[must_use]
    pub fn new(shared: SharedMoodLabel) -> Self {
        shared.set("neutral");
        Self {
            emotion: "neutral".to_string(),
            tone: "neutral".to_string(),
            shared,
            store: None,
        }
    }

    /// Load persisted mood, falling back to neutral
    ///
    /// # Errors
    ///
    /// Returns error if persisted state cannot be read
    pub fn load(store: KvStore, shared: SharedMoodLabel) -> crate::Result<Self> {
        let persisted: PersistedMood = store.load(STORE_KEY)?.unwrap_or(PersistedMood {
            emotion: "neutral".to_string(),
            tone: "neutral".to_string(),
        });
        shared.set(&persisted.tone);
        Ok(Self {
            emotion: persisted.emotion,
            tone: persisted.tone,
            shared,
            store: Some(store),
        })
    }

    /// Current emotion label
    #[must_use]
    pub fn emotion(&self) -> &str {
        &self.emotion
    }

    /// Current tone label
    #[must_use]
    pub fn tone(&self) -> &str {
        &self.tone
    }

    /// React to one utterance: trigger emotions, adjust tone, maybe drift
    pub fn react(&mut self, input: &str) {
        let lower = input.to_lowercase();

        for (emotion, triggers) in EMOTION_TRIGGERS {
            if triggers.iter().any(|t| lower.contains(t)) {
                if self.emotion != emotion {
                    tracing::debug!(from = %self.emotion, to = emotion, "emotion shift");
                }
                self.emotion = emotion.to_string();
                break;
            }
        }

        let mut shifted = false;
        for (tone, cues) in TONE_SHIFTS {
            if cues.iter().any(|c| lower.contains(c)) {
                self.set_tone(tone);
                shifted = true;
                break;
            }
        }

        // Left alone, the tone sometimes wanders on its own
        if !shifted && rand::thread_rng().gen_bool(DRIFT_CHANCE) {
            if let Some(tone) = DRIFT_TONES.choose(&mut rand::thread_rng()) {
                self.set_tone(tone);
            }
        }

        self.persist();
    }

    fn set_tone(&mut self, tone: &str) {
        if self.tone != tone {
            tracing::debug!(from = %self.tone, to = tone, "tone shift");
        }
        self.tone = tone.to_string();
        self.shared.set(tone);
    }

    /// Best-effort: a failed mood save never disturbs the conversation
    fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let persisted = PersistedMood {
            emotion: self.emotion.clone(),
            tone: self.tone.clone(),
        };
        if let Err(e) = store.save(STORE_KEY, &persisted) {
            tracing::warn!(error = %e, "failed to persist mood");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emotion_triggers() {
        let mut mood = MoodState::new(SharedMoodLabel::new("neutral"));
        mood.react("I had a rough day and I'm so tired");
        assert_eq!(mood.emotion(), "comforting");

        mood.react("wow that's incredible");
        assert_eq!(mood.emotion(), "surprised");
    }

    #[test]
    fn test_tone_syncs_shared_label() {
        let shared = SharedMoodLabel::new("neutral");
        let mut mood = MoodState::new(shared.clone());

        mood.react("tell me a joke, something funny");
        assert_eq!(mood.tone(), "playful");
        assert_eq!(shared.get(), "playful");
    }

    #[test]
    fn test_first_trigger_wins() {
        let mut mood = MoodState::new(SharedMoodLabel::new("neutral"));
        mood.react("you're so cute but also kind of annoying");
        assert_eq!(mood.emotion(), "flustered");
    }

    #[test]
    fn test_mood_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::open(dir.path()).unwrap();

        let mut mood =
            MoodState::load(store.clone(), SharedMoodLabel::new("neutral")).unwrap();
        mood.react("let's play a game");
        assert_eq!(mood.tone(), "playful");

        let shared = SharedMoodLabel::new("neutral");
        let reloaded = MoodState::load(store, shared.clone()).unwrap();
        assert_eq!(reloaded.tone(), "playful");
        assert_eq!(shared.get(), "playful");
    }
}

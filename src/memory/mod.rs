//! Persistent memory: goals, preferences, mood, emotional moments, journal

mod emotional;
mod goals;
mod history;
mod journal;
mod mood;
mod preferences;
mod store;

pub use emotional::{EmotionalMemory, EmotionalMoment};
pub use goals::{Goal, GoalBook};
pub use history::{DialogueHistory, DialogueTurn};
pub use journal::Journal;
pub use mood::MoodState;
pub use preferences::PreferenceTracker;
pub use store::KvStore;

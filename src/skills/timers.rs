//! Timers and recurring reminders
//!
//! Durations are parsed from digits or spelled-out numbers up to twenty.
//! "every" makes the reminder recurring. Expiry is announced through both
//! the display and the speech queue.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::memory::KvStore;
use crate::router::ActionContext;
use crate::sched::Scheduler;
use crate::ui::DisplaySink;
use crate::voice::SpeechQueue;

const STORE_KEY: &str = "timers";

const NUMBER_WORDS: [(&str, u64); 21] = [
    ("zero", 0),
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
    ("thirteen", 13),
    ("fourteen", 14),
    ("fifteen", 15),
    ("sixteen", 16),
    ("seventeen", 17),
    ("eighteen", 18),
    ("nineteen", 19),
    ("twenty", 20),
];

/// A parsed timer request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerRequest {
    /// How long until it fires
    pub duration: Duration,
    /// Spoken form of the duration, e.g. "5 minutes"
    pub duration_phrase: String,
    /// What the timer is for
    pub label: String,
    /// Whether it repeats
    pub recurring: bool,
}

/// Replace spelled-out numbers with digits so one pattern matches both
fn words_to_numbers(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let cleaned = word.trim_matches(|c: char| !c.is_alphanumeric());
            NUMBER_WORDS
                .iter()
                .find(|(w, _)| *w == cleaned.to_lowercase())
                .map_or_else(|| word.to_string(), |(_, n)| n.to_string())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a timer request out of an utterance
#[must_use]
pub fn parse_timer(text: &str) -> Option<TimerRequest> {
    static DURATION_RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    let duration_re = DURATION_RE.get_or_init(|| {
        regex::Regex::new(r"(\d+)\s*(seconds?|minutes?|hours?)").expect("valid duration pattern")
    });

    let normalized = words_to_numbers(text);
    let lower = normalized.to_lowercase();

    let captures = duration_re.captures(&lower)?;
    let amount: u64 = captures[1].parse().ok()?;
    let unit = &captures[2];

    let seconds = match unit.chars().next() {
        Some('s') => amount,
        Some('m') => amount * 60,
        Some('h') => amount * 3600,
        _ => return None,
    };

    let unit_word = if amount == 1 {
        unit.trim_end_matches('s').to_string()
    } else if unit.ends_with('s') {
        unit.to_string()
    } else {
        format!("{unit}s")
    };

    Some(TimerRequest {
        duration: Duration::from_secs(seconds),
        duration_phrase: format!("{amount} {unit_word}"),
        label: extract_label(&lower).unwrap_or_else(|| "timer".to_string()),
        recurring: lower.contains("every"),
    })
}

/// Label comes from a trailing "for ..." clause that isn't the duration
fn extract_label(lower: &str) -> Option<String> {
    static LABEL_RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    let label_re = LABEL_RE.get_or_init(|| {
        regex::Regex::new(r"for\s+(?:the\s+|my\s+|a\s+)?([a-z][a-z\s]*?)(?:\s+in\s+\d|$)")
            .expect("valid label pattern")
    });

    for captures in label_re.captures_iter(lower) {
        let candidate = captures[1].trim();
        if candidate.is_empty()
            || candidate
                .split_whitespace()
                .next()
                .is_some_and(|w| w.parse::<u64>().is_ok())
            || candidate.contains("second")
            || candidate.contains("minute")
            || candidate.contains("hour")
        {
            continue;
        }
        return Some(candidate.to_string());
    }
    None
}

/// Record of a set timer, kept for inspection across restarts
#[derive(Debug, Serialize, Deserialize)]
struct TimerRecord {
    label: String,
    duration_secs: u64,
    recurring: bool,
    set_at: chrono::DateTime<chrono::Local>,
}

/// Sets timers and recurring reminders
pub struct TimerSkill {
    sched: Scheduler,
    speech: SpeechQueue,
    display: Arc<dyn DisplaySink>,
    assistant_label: String,
    store: Option<KvStore>,
}

impl TimerSkill {
    /// Create the timer skill; `store` keeps a log of set timers
    #[must_use]
    pub fn new(
        sched: Scheduler,
        speech: SpeechQueue,
        display: Arc<dyn DisplaySink>,
        assistant_label: String,
        store: Option<KvStore>,
    ) -> Self {
        Self {
            sched,
            speech,
            display,
            assistant_label,
            store,
        }
    }

    /// Handle a timer request, returning the spoken confirmation and the
    /// context to carry over
    #[must_use]
    pub fn handle(&self, text: &str) -> (String, Option<ActionContext>) {
        let Some(request) = parse_timer(text) else {
            return (
                "Sorry, I didn't catch the timer duration.".to_string(),
                None,
            );
        };

        self.record(&request);

        let announce = {
            let speech = self.speech.clone();
            let display = Arc::clone(&self.display);
            let label = request.label.clone();
            let speaker = self.assistant_label.clone();
            let recurring = request.recurring;
            move || {
                let message = if recurring {
                    format!("Reminder: It's time for your {label}!")
                } else {
                    format!("Timer for {label} is up!")
                };
                display.line(&speaker, &message);
                speech.say(message);
            }
        };

        let confirmation = if request.recurring {
            tracing::info!(
                duration = %request.duration_phrase,
                label = %request.label,
                "recurring reminder set"
            );
            self.sched.spawn_every(request.duration, move || {
                let announce = announce.clone();
                async move { announce() }
            });
            format!(
                "Okay, I'll remind you every {} for your {}.",
                request.duration_phrase, request.label
            )
        } else {
            tracing::info!(
                duration = %request.duration_phrase,
                label = %request.label,
                "timer set"
            );
            self.sched
                .spawn_after(request.duration, async move { announce() });
            format!("Okay, timer set for {}.", request.duration_phrase)
        };

        (confirmation, Some(ActionContext::Timer))
    }

    /// Best-effort append to the persisted timer log
    fn record(&self, request: &TimerRequest) {
        let Some(store) = &self.store else {
            return;
        };
        let mut records: Vec<TimerRecord> = match store.load(STORE_KEY) {
            Ok(records) => records.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read timer log");
                return;
            }
        };
        records.push(TimerRecord {
            label: request.label.clone(),
            duration_secs: request.duration.as_secs(),
            recurring: request.recurring,
            set_at: chrono::Local::now(),
        });
        if let Err(e) = store.save(STORE_KEY, &records) {
            tracing::warn!(error = %e, "failed to persist timer log");
        }
    }

    /// Spoken response for "stop" while a timer was the last action
    #[must_use]
    pub fn stop_message() -> String {
        "There's no specific timer to stop just yet. Want me to cancel the current one?".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_digits() {
        let req = parse_timer("set a timer for 5 minutes").unwrap();
        assert_eq!(req.duration, Duration::from_secs(300));
        assert_eq!(req.duration_phrase, "5 minutes");
        assert!(!req.recurring);
    }

    #[test]
    fn test_parse_spelled_out() {
        let req = parse_timer("set a timer for ten seconds").unwrap();
        assert_eq!(req.duration, Duration::from_secs(10));
        assert_eq!(req.duration_phrase, "10 seconds");
    }

    #[test]
    fn test_parse_recurring_with_label() {
        let req = parse_timer("remind me every 2 hours for my stretch break").unwrap();
        assert_eq!(req.duration, Duration::from_secs(7200));
        assert!(req.recurring);
        assert_eq!(req.label, "stretch break");
    }

    #[test]
    fn test_missing_duration() {
        assert!(parse_timer("set a timer").is_none());
        assert!(parse_timer("remind me later").is_none());
    }

    #[test]
    fn test_singular_unit_phrase() {
        let req = parse_timer("timer for 1 minute").unwrap();
        assert_eq!(req.duration_phrase, "1 minute");
    }
}

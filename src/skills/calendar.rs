//! Calendar events
//!
//! Events are stored as plain titles with a best-effort parsed time.
//! Parsing is modest on purpose: "at 3pm", "tomorrow", a weekday name, or
//! "every <weekday>" for recurring events.

use chrono::{Datelike, Duration as ChronoDuration, Local, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::memory::KvStore;
use crate::Result;

const STORE_KEY: &str = "calendar";

const WEEKDAYS: [(&str, Weekday); 7] = [
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sunday", Weekday::Sun),
];

/// One scheduled event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Cleaned-up title
    pub title: String,
    /// Resolved start time, when one could be parsed
    pub when: Option<chrono::DateTime<Local>>,
    /// Weekday for recurring events
    pub recurring_weekday: Option<String>,
}

/// Creates and reads back calendar events
pub struct CalendarSkill {
    store: KvStore,
    events: Vec<CalendarEvent>,
}

impl CalendarSkill {
    /// Load the calendar from the store
    ///
    /// # Errors
    ///
    /// Returns error if persisted state cannot be read
    pub fn load(store: KvStore) -> Result<Self> {
        let events = store.load(STORE_KEY)?.unwrap_or_default();
        Ok(Self { store, events })
    }

    /// Create an event from an utterance and return the spoken confirmation
    ///
    /// # Errors
    ///
    /// Returns error if the updated calendar cannot be persisted
    pub fn create(&mut self, text: &str) -> Result<String> {
        let title = clean_title(text);
        if title.is_empty() {
            return Ok("I couldn't tell what the event should be called.".to_string());
        }

        let lower = text.to_lowercase();
        let recurring_weekday = if lower.contains("every") {
            WEEKDAYS
                .iter()
                .find(|(name, _)| lower.contains(name))
                .map(|(name, _)| (*name).to_string())
        } else {
            None
        };
        let when = if recurring_weekday.is_some() {
            None
        } else {
            parse_event_time(&lower)
        };

        let confirmation = match (&when, &recurring_weekday) {
            (_, Some(day)) => format!("Got it, {title} every {day} is on your calendar."),
            (Some(when), _) => format!(
                "Got it, {title} on {} is on your calendar.",
                when.format("%A at %-I:%M %p")
            ),
            (None, None) => format!("Got it, I've added {title} to your calendar."),
        };

        self.events.push(CalendarEvent {
            title,
            when,
            recurring_weekday,
        });
        self.store.save(STORE_KEY, &self.events)?;
        tracing::debug!(total = self.events.len(), "calendar event added");

        Ok(confirmation)
    }

    /// Spoken summary of upcoming events for the window the request implies
    #[must_use]
    pub fn read_upcoming(&self, text: &str) -> String {
        let lower = text.to_lowercase();
        let days = if lower.contains("week") {
            7
        } else if lower.contains("tomorrow") {
            2
        } else {
            1
        };
        let horizon = Local::now() + ChronoDuration::days(days);

        let upcoming: Vec<String> = self
            .events
            .iter()
            .filter(|event| {
                event.recurring_weekday.is_some()
                    || event
                        .when
                        .is_none_or(|when| when >= Local::now() && when <= horizon)
            })
            .map(|event| match (&event.when, &event.recurring_weekday) {
                (_, Some(day)) => format!("{} every {day}", event.title),
                (Some(when), _) => format!("{} on {}", event.title, when.format("%A")),
                (None, None) => event.title.clone(),
            })
            .collect();

        if upcoming.is_empty() {
            "You have no upcoming events.".to_string()
        } else {
            format!("Here's what's coming up: {}.", upcoming.join("; "))
        }
    }

    /// Number of stored events
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the calendar is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Strip command scaffolding words so only the event title remains
fn clean_title(text: &str) -> String {
    static STOPWORD_RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    let stopword_re = STOPWORD_RE.get_or_init(|| {
        regex::Regex::new(
            r"(?i)\b(?:add|set|schedule|remind|calendar|event|to|on|at|for|every|called|name|me|my|a|an|the|tomorrow|monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b|\b\d{1,2}(?::\d{2})?\s*(?:am|pm)?\b",
        )
        .expect("valid stopword pattern")
    });

    stopword_re
        .replace_all(text, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
        .to_string()
}

/// Best-effort event time: "at 3pm" style clock, "tomorrow", or a weekday
fn parse_event_time(lower: &str) -> Option<chrono::DateTime<Local>> {
    static TIME_RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    let time_re = TIME_RE.get_or_init(|| {
        regex::Regex::new(r"at\s+(\d{1,2})(?::(\d{2}))?\s*(am|pm)?").expect("valid time pattern")
    });

    let now = Local::now();
    let mut date = now.date_naive();

    if lower.contains("tomorrow") {
        date = date.succ_opt()?;
    } else if let Some((_, weekday)) = WEEKDAYS.iter().find(|(name, _)| lower.contains(name)) {
        let mut candidate = date.succ_opt()?;
        while candidate.weekday() != *weekday {
            candidate = candidate.succ_opt()?;
        }
        date = candidate;
    }

    let time = time_re.captures(lower).and_then(|captures| {
        let mut hour: u32 = captures[1].parse().ok()?;
        let minute: u32 = captures
            .get(2)
            .map_or(Some(0), |m| m.as_str().parse().ok())?;
        match captures.get(3).map(|m| m.as_str()) {
            Some("pm") if hour < 12 => hour += 12,
            Some("am") if hour == 12 => hour = 0,
            _ => {}
        }
        NaiveTime::from_hms_opt(hour, minute, 0)
    });

    // A bare date with no clock time still counts, anchored at 9am
    let time = match time {
        Some(t) => t,
        None if date != now.date_naive() => NaiveTime::from_hms_opt(9, 0, 0)?,
        None => return None,
    };

    date.and_time(time).and_local_timezone(Local).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calendar() -> (tempfile::TempDir, CalendarSkill) {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::open(dir.path()).unwrap();
        let cal = CalendarSkill::load(store).unwrap();
        (dir, cal)
    }

    #[test]
    fn test_create_strips_scaffolding() {
        let (_dir, mut cal) = calendar();
        let reply = cal
            .create("add a calendar event for band practice on friday at 7pm")
            .unwrap();
        assert!(reply.contains("band practice"));
        assert_eq!(cal.len(), 1);
    }

    #[test]
    fn test_recurring_weekday() {
        let (_dir, mut cal) = calendar();
        let reply = cal.create("schedule yoga every tuesday").unwrap();
        assert!(reply.contains("every tuesday"));
    }

    #[test]
    fn test_read_empty() {
        let (_dir, cal) = calendar();
        assert_eq!(cal.read_upcoming("what's on my calendar"), "You have no upcoming events.");
    }

    #[test]
    fn test_read_lists_created_events() {
        let (_dir, mut cal) = calendar();
        cal.create("add dentist appointment tomorrow at 10am").unwrap();
        let summary = cal.read_upcoming("what's happening tomorrow");
        assert!(summary.contains("dentist appointment"));
    }

    #[test]
    fn test_untitled_event_rejected() {
        let (_dir, mut cal) = calendar();
        let reply = cal.create("add an event at 3pm").unwrap();
        assert!(reply.contains("couldn't tell"));
        assert!(cal.is_empty());
    }
}

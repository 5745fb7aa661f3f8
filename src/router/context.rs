//! Conversational carry-over context and activity tracking

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// The kind of action a clause resolved to, carried over so bare verbs in
/// later clauses ("stop", "play") inherit the right target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionContext {
    /// Weather lookup
    Weather,
    /// Timer or reminder
    Timer,
    /// Calendar event
    Calendar,
    /// Script execution
    Script,
    /// Media playback
    Media,
}

/// Per-conversation carry-over state, owned by the router task
#[derive(Debug, Default)]
pub struct ContextState {
    last_action: Option<ActionContext>,
    last_media_query: Option<String>,
}

impl ContextState {
    /// Create empty context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Action the previous clause resolved to, if any
    #[must_use]
    pub const fn last_action(&self) -> Option<ActionContext> {
        self.last_action
    }

    /// Record the action a clause resolved to
    pub fn set_last_action(&mut self, action: ActionContext) {
        self.last_action = Some(action);
    }

    /// What was last asked to play, for bare "play" requests
    #[must_use]
    pub fn last_media_query(&self) -> Option<&str> {
        self.last_media_query.as_deref()
    }

    /// Record what was asked to play
    pub fn set_last_media_query(&mut self, query: &str) {
        self.last_media_query = Some(query.to_string());
    }

    /// Forget the carry-over
    pub fn clear(&mut self) {
        self.last_action = None;
        self.last_media_query = None;
    }
}

/// Timestamp of the last user interaction, shared across tasks
#[derive(Clone)]
pub struct ActivityTracker {
    last: Arc<Mutex<Instant>>,
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityTracker {
    /// Create a tracker marked active now
    #[must_use]
    pub fn new() -> Self {
        Self {
            last: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Mark the user as active now
    pub fn touch(&self) {
        if let Ok(mut last) = self.last.lock() {
            *last = Instant::now();
        }
    }

    /// Time since the last interaction
    #[must_use]
    pub fn idle_for(&self) -> Duration {
        self.last
            .lock()
            .map(|last| last.elapsed())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_carry_over() {
        let mut ctx = ContextState::new();
        assert!(ctx.last_action().is_none());

        ctx.set_last_action(ActionContext::Media);
        assert_eq!(ctx.last_action(), Some(ActionContext::Media));

        ctx.clear();
        assert!(ctx.last_action().is_none());
    }

    #[test]
    fn test_activity_touch_resets_idle() {
        let tracker = ActivityTracker::new();
        std::thread::sleep(Duration::from_millis(20));
        assert!(tracker.idle_for() >= Duration::from_millis(20));

        tracker.touch();
        assert!(tracker.idle_for() < Duration::from_millis(20));
    }
}

//! Proactive follow-up questions
//!
//! After some exchanges the companion circles back with one short question
//! about what the user said. Questions are generated off the conversation
//! path after a small random delay, deduplicated, rate limited, and pushed
//! to the notifier when the user has gone idle.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rand::Rng;

use crate::llm::Generator;
use crate::notify::Notifier;
use crate::persona::Persona;
use crate::router::ActivityTracker;
use crate::sched::Scheduler;
use crate::ui::DisplaySink;

const MIN_DELAY_SECS: u64 = 4;
const MAX_DELAY_SECS: u64 = 8;
const MIN_QUESTION_WORDS: usize = 3;

/// No two follow-ups inside this window, and never the same question twice
/// in a row
const RATE_WINDOW: Duration = Duration::from_secs(120);

/// Idle time after which a follow-up also goes out through the notifier
const IDLE_NOTIFY_THRESHOLD: Duration = Duration::from_secs(120);

#[derive(Default)]
struct FollowUpState {
    last_question: String,
    last_asked: Option<Instant>,
}

/// Schedules delayed follow-up questions about recent topics
#[derive(Clone)]
pub struct FollowUpScheduler {
    generator: Arc<dyn Generator>,
    persona: Persona,
    display: Arc<dyn DisplaySink>,
    notifier: Option<Arc<dyn Notifier>>,
    sched: Scheduler,
    activity: ActivityTracker,
    state: Arc<Mutex<FollowUpState>>,
}

impl FollowUpScheduler {
    /// Create a follow-up scheduler
    #[must_use]
    pub fn new(
        generator: Arc<dyn Generator>,
        persona: Persona,
        display: Arc<dyn DisplaySink>,
        notifier: Option<Arc<dyn Notifier>>,
        sched: Scheduler,
        activity: ActivityTracker,
    ) -> Self {
        Self {
            generator,
            persona,
            display,
            notifier,
            sched,
            activity,
            state: Arc::new(Mutex::new(FollowUpState::default())),
        }
    }

    /// Schedule one follow-up about `topic` after a short random delay
    ///
    /// The question may still be dropped at fire time if it fails quality
    /// checks or the rate window.
    pub fn schedule(&self, topic: &str) {
        let delay =
            Duration::from_secs(rand::thread_rng().gen_range(MIN_DELAY_SECS..=MAX_DELAY_SECS));
        tracing::debug!(?delay, topic = %topic, "follow-up scheduled");

        let this = self.clone();
        let topic = topic.to_string();
        self.sched.spawn_after(delay, async move {
            this.fire(&topic).await;
        });
    }

    async fn fire(&self, topic: &str) {
        let question = match self
            .generator
            .generate(
                &self.persona.system_prompt(),
                &self.persona.followup_prompt(topic),
            )
            .await
        {
            Ok(q) => q.trim().to_string(),
            Err(e) => {
                tracing::debug!(error = %e, "follow-up generation failed, dropping");
                return;
            }
        };

        if question.is_empty() || question.split_whitespace().count() < MIN_QUESTION_WORDS {
            tracing::debug!(question = %question, "follow-up too thin, dropping");
            return;
        }

        if !self.try_record(&question) {
            return;
        }

        // Follow-ups are shown, not spoken; only idle users get them
        // pushed out through the notifier
        self.display.line(&self.persona.name, &question);

        if self.activity.idle_for() >= IDLE_NOTIFY_THRESHOLD {
            if let Some(notifier) = &self.notifier {
                let message = format!("{} asks: {}", self.persona.name, question);
                if let Err(e) = notifier.notify(&message).await {
                    tracing::warn!(error = %e, "follow-up notification failed");
                }
            }
        }
    }

    /// Apply dedup and rate checks; record the question if it passes
    fn try_record(&self, question: &str) -> bool {
        let Ok(mut state) = self.state.lock() else {
            return false;
        };

        if state.last_question == question {
            tracing::debug!("duplicate follow-up, dropping");
            return false;
        }
        if state
            .last_asked
            .is_some_and(|asked| asked.elapsed() < RATE_WINDOW)
        {
            tracing::debug!("follow-up inside rate window, dropping");
            return false;
        }

        state.last_question = question.to_string();
        state.last_asked = Some(Instant::now());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    use crate::Result;

    struct EchoGenerator;

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(&self, _system: &str, user: &str) -> Result<String> {
            Ok(user.to_string())
        }
    }

    struct NullDisplay;

    impl DisplaySink for NullDisplay {
        fn line(&self, _speaker: &str, _text: &str) {}
    }

    fn scheduler() -> FollowUpScheduler {
        FollowUpScheduler::new(
            Arc::new(EchoGenerator),
            Persona::default(),
            Arc::new(NullDisplay),
            None,
            Scheduler::new(),
            ActivityTracker::new(),
        )
    }

    fn backdate_last_asked(followups: &FollowUpScheduler) {
        followups.state.lock().unwrap().last_asked = Instant::now().checked_sub(RATE_WINDOW * 2);
    }

    #[test]
    fn test_rate_window_blocks_back_to_back_questions() {
        let followups = scheduler();
        assert!(followups.try_record("what did you end up listening to?"));
        assert!(!followups.try_record("did the timer help at all?"));
    }

    #[test]
    fn test_never_repeats_previous_question() {
        let followups = scheduler();
        assert!(followups.try_record("how did the recipe turn out?"));

        backdate_last_asked(&followups);
        assert!(!followups.try_record("how did the recipe turn out?"));
    }

    #[test]
    fn test_accepts_new_question_after_window() {
        let followups = scheduler();
        assert!(followups.try_record("how did the recipe turn out?"));

        backdate_last_asked(&followups);
        assert!(followups.try_record("did you get some rest?"));
    }
}

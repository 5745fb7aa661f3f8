//! Intent routing
//!
//! One utterance may carry several intents. The router splits it into
//! clauses, resolves each against the skills in a fixed predicate order,
//! and falls through to open-ended generation. All conversational state
//! (mood, memory, carry-over context) is owned by a single actor task, so
//! concurrent surfaces cannot race it; callers go through [`RouterHandle`].

mod context;
mod split;

pub use context::{ActionContext, ActivityTracker, ContextState};
pub use split::{ClauseSplitter, KeywordSplitter};

use std::sync::Arc;

use rand::Rng;
use tokio::sync::{mpsc, oneshot};

use crate::environment::{InternalClock, VirtualEnvironment};
use crate::followup::FollowUpScheduler;
use crate::llm::Generator;
use crate::memory::{DialogueHistory, EmotionalMemory, GoalBook, Journal, MoodState, PreferenceTracker};
use crate::persona::{build_prompts, Persona};
use crate::skills::{
    extract_media_query, extract_place, extract_query, parse_timer, ScriptSkill, SkillRegistry,
    TimerSkill, MSG_NO_MEDIA, MSG_NO_SEARCH, MSG_NO_WEATHER,
};
use crate::Result;

const SEARCH_KEYWORDS: [&str; 3] = ["search", "look up", "find info about"];

/// Recall cues that turn "remember"/"did i" into a goal-recall request
const RECALL_KEYWORDS: [&str; 5] = ["ask", "tell", "save", "remember when", "my goals"];

/// Spoken when the router cannot produce anything better
pub const FALLBACK_RESPONSE: &str = "I had trouble figuring that one out.";

/// Generated replies are clipped to this many words before speaking
const MAX_RESPONSE_WORDS: usize = 60;

const JOURNAL_CHANCE: f64 = 0.02;
const FOLLOWUP_CHANCE: f64 = 0.25;

const COMMAND_QUEUE_DEPTH: usize = 32;

struct RouterCommand {
    utterance: String,
    reply: oneshot::Sender<String>,
}

/// What routing one clause produced
enum ClauseOutcome {
    /// Response for this clause; later clauses still run
    Reply(String),
    /// Response that ends the whole call, bypassing remaining clauses
    ShortCircuit(String),
}

/// Cheap clonable handle for sending utterances to the router task
#[derive(Clone)]
pub struct RouterHandle {
    tx: mpsc::Sender<RouterCommand>,
}

impl RouterHandle {
    /// Route one utterance and wait for the response
    ///
    /// Never fails from the caller's perspective; internal errors come back
    /// as [`FALLBACK_RESPONSE`].
    pub async fn handle(&self, utterance: &str) -> String {
        let (reply_tx, reply_rx) = oneshot::channel();
        let command = RouterCommand {
            utterance: utterance.to_string(),
            reply: reply_tx,
        };

        if self.tx.send(command).await.is_err() {
            tracing::error!("router task gone");
            return FALLBACK_RESPONSE.to_string();
        }
        reply_rx.await.unwrap_or_else(|_| {
            tracing::error!("router dropped reply channel");
            FALLBACK_RESPONSE.to_string()
        })
    }
}

/// Everything the router owns
pub struct RouterParts {
    /// Open-ended response generation
    pub generator: Arc<dyn Generator>,
    /// Practical skills
    pub skills: SkillRegistry,
    /// Clause splitting strategy
    pub splitter: Box<dyn ClauseSplitter>,
    /// Companion identity
    pub persona: Persona,
    /// Imagined surroundings for prompt context
    pub environment: VirtualEnvironment,
    /// Emotion and tone state
    pub mood: MoodState,
    /// Explicit remembered items
    pub goals: GoalBook,
    /// Learned likes and dislikes
    pub preferences: PreferenceTracker,
    /// Sampled emotional moments
    pub emotional: EmotionalMemory,
    /// Private reflections
    pub journal: Journal,
    /// Full conversation log
    pub history: DialogueHistory,
    /// Proactive follow-up questions
    pub followups: FollowUpScheduler,
}

/// Single-owner routing actor
pub struct IntentRouter {
    generator: Arc<dyn Generator>,
    skills: SkillRegistry,
    splitter: Box<dyn ClauseSplitter>,
    persona: Persona,
    clock: InternalClock,
    environment: VirtualEnvironment,
    mood: MoodState,
    goals: GoalBook,
    preferences: PreferenceTracker,
    emotional: EmotionalMemory,
    journal: Journal,
    history: DialogueHistory,
    followups: FollowUpScheduler,
    context: ContextState,
}

impl IntentRouter {
    /// Spawn the router task and return a handle to it
    #[must_use]
    pub fn spawn(parts: RouterParts) -> RouterHandle {
        let mut router = Self {
            generator: parts.generator,
            skills: parts.skills,
            splitter: parts.splitter,
            persona: parts.persona,
            clock: InternalClock::new(),
            environment: parts.environment,
            mood: parts.mood,
            goals: parts.goals,
            preferences: parts.preferences,
            emotional: parts.emotional,
            journal: parts.journal,
            history: parts.history,
            followups: parts.followups,
            context: ContextState::new(),
        };

        let (tx, mut rx) = mpsc::channel::<RouterCommand>(COMMAND_QUEUE_DEPTH);
        tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                let response = match router.handle_utterance(&command.utterance).await {
                    Ok(response) => response,
                    Err(e) => {
                        tracing::warn!(error = %e, "routing failed");
                        FALLBACK_RESPONSE.to_string()
                    }
                };
                // Caller may have given up waiting; nothing to do then
                let _ = command.reply.send(response);
            }
            tracing::debug!("router task stopped");
        });

        RouterHandle { tx }
    }

    async fn handle_utterance(&mut self, input: &str) -> Result<String> {
        let clauses = self.splitter.split(input);
        if clauses.is_empty() {
            return Ok(FALLBACK_RESPONSE.to_string());
        }

        let mut responses = Vec::with_capacity(clauses.len());
        for clause in &clauses {
            self.mood.react(clause);
            // Memory writes are best-effort; a failed save must never cost
            // the caller their answer
            if let Err(e) = self.preferences.observe(clause) {
                tracing::warn!(error = %e, "preference learning failed");
            }

            let reply = match self.route_clause(clause).await? {
                ClauseOutcome::ShortCircuit(text) => return Ok(text),
                ClauseOutcome::Reply(reply) => reply,
            };
            if reply.trim().is_empty() {
                continue;
            }

            if let Err(e) = self.history.append(clause, &reply) {
                tracing::warn!(error = %e, "dialogue history write failed");
            }
            if let Err(e) = self.emotional.maybe_record(clause, &reply) {
                tracing::warn!(error = %e, "emotional memory write failed");
            }

            // Statements sometimes earn a follow-up later; questions
            // already got their answer
            if !reply.contains('?') && rand::thread_rng().gen_bool(FOLLOWUP_CHANCE) {
                self.followups.schedule(clause);
            }

            responses.push(reply);
        }
        let joined = responses.join("\n");

        if rand::thread_rng().gen_bool(JOURNAL_CHANCE) {
            let prompt = self.persona.reflection_prompt(&joined);
            if let Err(e) = self.journal.reflect(self.generator.as_ref(), &prompt).await {
                tracing::debug!(error = %e, "journal reflection failed");
            }
        }

        Ok(joined)
    }

    /// Resolve one clause; checked in order, first match wins
    async fn route_clause(&mut self, clause: &str) -> Result<ClauseOutcome> {
        let lower = clause.to_lowercase();

        if lower.contains("what have you been thinking about") {
            return Ok(ClauseOutcome::ShortCircuit(
                self.journal.share_random_thought(),
            ));
        }

        if lower.contains("weather") {
            self.context.set_last_action(ActionContext::Weather);
            return Ok(ClauseOutcome::Reply(self.weather_reply(clause).await));
        }

        if SEARCH_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            let query = extract_query(clause).unwrap_or_else(|| clause.to_string());
            return Ok(ClauseOutcome::Reply(self.search_reply(&query).await));
        }

        if lower.contains("timer") || (lower.contains("remind") && parse_timer(&lower).is_some()) {
            let (reply, action) = self.skills.timers.handle(clause);
            if let Some(action) = action {
                self.context.set_last_action(action);
            }
            return Ok(ClauseOutcome::Reply(reply));
        }

        if lower.contains("calendar")
            || lower.contains("appointment")
            || lower.contains("schedule")
            || lower.contains("event")
        {
            self.context.set_last_action(ActionContext::Calendar);
            return self.calendar_reply(clause, &lower).map(ClauseOutcome::Reply);
        }

        if let Some(name) = ScriptSkill::extract_name(clause) {
            self.context.set_last_action(ActionContext::Script);
            let reply = match self.skills.scripts.run(&name) {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::warn!(error = %e, script = %name, "script start failed");
                    format!("I couldn't start the script {name}.")
                }
            };
            return Ok(ClauseOutcome::Reply(reply));
        }

        if lower.contains("stop") {
            return Ok(ClauseOutcome::Reply(self.stop_reply(&lower)));
        }

        if lower.contains("play") {
            return Ok(ClauseOutcome::Reply(self.media_reply(clause)));
        }

        if lower.contains("special memory") || lower.contains("favorite memory") {
            return Ok(ClauseOutcome::ShortCircuit(self.emotional.share_random()));
        }

        if lower.contains("remind me") || lower.contains("remember that") {
            return Ok(ClauseOutcome::Reply(self.store_goal_reply(clause, &lower)));
        }

        if (lower.contains("remember") || lower.contains("did i"))
            && RECALL_KEYWORDS.iter().any(|kw| lower.contains(kw))
        {
            return Ok(ClauseOutcome::Reply(self.goals.recall()));
        }

        if lower.contains("what do i like")
            || lower.contains("my preferences")
            || lower.contains("know about me")
        {
            return Ok(ClauseOutcome::Reply(self.preferences.summarize()));
        }

        self.generate_reply(clause).await.map(ClauseOutcome::Reply)
    }

    async fn weather_reply(&self, clause: &str) -> String {
        let Some(weather) = &self.skills.weather else {
            return MSG_NO_WEATHER.to_string();
        };
        let place = extract_place(clause);
        match weather.report(place.as_deref()).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(error = %e, "weather lookup failed");
                MSG_NO_WEATHER.to_string()
            }
        }
    }

    fn calendar_reply(&mut self, clause: &str, lower: &str) -> Result<String> {
        let reading = lower.contains("what's on")
            || ["what", "read", "show", "check", "do i have", "anything"]
                .iter()
                .any(|cue| lower.starts_with(cue));
        if reading {
            Ok(self.skills.calendar.read_upcoming(clause))
        } else {
            self.skills.calendar.create(clause)
        }
    }

    /// "stop" resolves against what it names, else against the carry-over
    /// from the previous clause
    fn stop_reply(&mut self, lower: &str) -> String {
        if lower.contains("script") {
            return self.skills.scripts.stop();
        }
        if lower.contains("music") || lower.contains("song") || lower.contains("playing") {
            return self.stop_media();
        }
        if lower.contains("timer") || lower.contains("reminder") {
            return TimerSkill::stop_message();
        }

        match self.context.last_action() {
            Some(ActionContext::Media) => self.stop_media(),
            Some(ActionContext::Timer) => TimerSkill::stop_message(),
            Some(ActionContext::Script) => self.skills.scripts.stop(),
            _ => "There's nothing for me to stop right now.".to_string(),
        }
    }

    fn stop_media(&self) -> String {
        match &self.skills.media {
            Some(media) => media.stop(),
            None => "Nothing is playing right now.".to_string(),
        }
    }

    fn media_reply(&mut self, clause: &str) -> String {
        // Bare "play" inherits the last requested query
        let query = extract_media_query(clause).or_else(|| {
            self.context
                .last_media_query()
                .map(ToString::to_string)
        });
        let Some(query) = query else {
            return "What would you like me to play?".to_string();
        };

        self.context.set_last_action(ActionContext::Media);
        self.context.set_last_media_query(&query);

        let Some(media) = &self.skills.media else {
            return MSG_NO_MEDIA.to_string();
        };
        match media.play(&query) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "media playback failed");
                MSG_NO_MEDIA.to_string()
            }
        }
    }

    async fn search_reply(&self, query: &str) -> String {
        let Some(search) = &self.skills.search else {
            return MSG_NO_SEARCH.to_string();
        };
        match search.search(query).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(error = %e, "search failed");
                "I couldn't find anything just now.".to_string()
            }
        }
    }

    /// Store the remembered item, stripped of its trigger phrase
    fn store_goal_reply(&mut self, clause: &str, lower: &str) -> String {
        for prefix in ["remember that ", "remind me to ", "remind me "] {
            if let Some(idx) = lower.find(prefix) {
                let item = clause[idx + prefix.len()..].trim();
                if !item.is_empty() {
                    return self.goals.remember(item);
                }
            }
        }
        self.goals.remember(clause.trim())
    }

    /// Open-ended generation with persona, mood, and surfaced memory
    async fn generate_reply(&mut self, input: &str) -> Result<String> {
        let memory = self
            .journal
            .maybe_surface()
            .or_else(|| self.emotional.latest_tagged());

        let (system, user) = build_prompts(
            &self.persona,
            &self.clock,
            &self.environment,
            self.mood.tone(),
            self.mood.emotion(),
            memory.as_deref(),
            input,
        );

        let raw = self.generator.generate(&system, &user).await?;
        Ok(truncate_words(&raw, MAX_RESPONSE_WORDS))
    }
}

/// Clip text to `max_words`, marking the cut with an ellipsis
#[must_use]
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return text.trim().to_string();
    }
    format!("{}...", words[..max_words].join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_words() {
        assert_eq!(truncate_words("short reply", 60), "short reply");

        let long = "word ".repeat(80);
        let out = truncate_words(&long, 60);
        assert_eq!(out.split_whitespace().count(), 60);
        assert!(out.ends_with("..."));
    }
}

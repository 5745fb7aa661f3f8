//! Shared test doubles and wiring helpers
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use ember_companion::environment::VirtualEnvironment;
use ember_companion::followup::FollowUpScheduler;
use ember_companion::memory::{
    DialogueHistory, EmotionalMemory, GoalBook, Journal, KvStore, MoodState, PreferenceTracker,
};
use ember_companion::persona::Persona;
use ember_companion::router::{
    ActivityTracker, IntentRouter, KeywordSplitter, RouterHandle, RouterParts,
};
use ember_companion::skills::{CalendarSkill, ScriptSkill, SkillRegistry, TimerSkill};
use ember_companion::ui::DisplaySink;
use ember_companion::voice::{Fidelity, SharedMoodLabel, SpeechQueue, Transcriber};
use ember_companion::{Generator, Result, Scheduler};

/// Generator that always returns the same text
pub struct FixedGenerator(pub String);

#[async_trait]
impl Generator for FixedGenerator {
    async fn generate(&self, _system: &str, _user: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Generator that always fails
pub struct FailingGenerator;

#[async_trait]
impl Generator for FailingGenerator {
    async fn generate(&self, _system: &str, _user: &str) -> Result<String> {
        Err(ember_companion::Error::Generation(
            "scripted failure".to_string(),
        ))
    }
}

/// Transcriber that replays a fixed sequence of transcripts
pub struct ScriptedTranscriber {
    responses: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
}

impl ScriptedTranscriber {
    pub fn new(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.iter().map(ToString::to_string).collect()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(
        &self,
        _samples: &[f32],
        _sample_rate: u32,
        _fidelity: Fidelity,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }
}

/// Display sink that records every line
#[derive(Default)]
pub struct RecordingDisplay {
    lines: Mutex<Vec<(String, String)>>,
}

impl RecordingDisplay {
    pub fn lines(&self) -> Vec<(String, String)> {
        self.lines.lock().unwrap().clone()
    }
}

impl DisplaySink for RecordingDisplay {
    fn line(&self, speaker: &str, text: &str) {
        self.lines
            .lock()
            .unwrap()
            .push((speaker.to_string(), text.to_string()));
    }
}

/// A router wired with no external skills (no weather, search, or media)
/// and fresh memory stores under a temp directory
///
/// The returned `TempDir` keeps the stores alive for the test's duration.
pub fn spawn_test_router(generator: Arc<dyn Generator>) -> (RouterHandle, SpeechQueue, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = KvStore::open(dir.path().join("memory")).expect("store");

    let persona = Persona::default();
    let sched = Scheduler::new();
    let (speech, _speech_rx) = SpeechQueue::new();
    let display: Arc<dyn DisplaySink> = Arc::new(RecordingDisplay::default());
    let activity = ActivityTracker::new();

    let followups = FollowUpScheduler::new(
        Arc::clone(&generator),
        persona.clone(),
        Arc::clone(&display),
        None,
        sched.clone(),
        activity,
    );

    let skills = SkillRegistry {
        weather: None,
        search: None,
        timers: TimerSkill::new(
            sched,
            speech.clone(),
            Arc::clone(&display),
            persona.name.clone(),
            None,
        ),
        calendar: CalendarSkill::load(store.clone()).expect("calendar"),
        media: None,
        scripts: ScriptSkill::new(dir.path().join("scripts")),
    };

    let handle = IntentRouter::spawn(RouterParts {
        generator,
        skills,
        splitter: Box::new(KeywordSplitter::new()),
        persona,
        environment: VirtualEnvironment::new(),
        mood: MoodState::new(SharedMoodLabel::new("neutral")),
        goals: GoalBook::load(store.clone()).expect("goals"),
        preferences: PreferenceTracker::load(store.clone()).expect("preferences"),
        emotional: EmotionalMemory::load(store.clone()).expect("emotional"),
        journal: Journal::load(store.clone()).expect("journal"),
        history: DialogueHistory::load(store).expect("history"),
        followups,
    });

    (handle, speech, dir)
}

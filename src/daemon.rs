//! Daemon wiring and lifecycle
//!
//! Builds every component from configuration, connects the surfaces
//! (microphone and terminal) to the router, and runs until ctrl-c. The
//! voice loop stays on the root task because audio streams cannot move
//! between threads; everything else runs on the runtime.

use std::sync::Arc;

use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

use crate::audio::AudioCapture;
use crate::config::Config;
use crate::followup::FollowUpScheduler;
use crate::llm::{ChatCompletions, Generator};
use crate::memory::{
    DialogueHistory, EmotionalMemory, GoalBook, Journal, KvStore, MoodState, PreferenceTracker,
};
use crate::notify::{Notifier, WebhookNotifier};
use crate::persona::Persona;
use crate::router::{ActivityTracker, IntentRouter, KeywordSplitter, RouterHandle, RouterParts};
use crate::sched::Scheduler;
use crate::skills::{
    CalendarSkill, MediaSkill, ScriptSkill, SearchSkill, SkillRegistry, TimerSkill, WeatherSkill,
};
use crate::ui::{ConsoleDisplay, DisplaySink, SpeakingFlag};
use crate::voice::{
    ListenerConfig, OpenAiTts, SharedMoodLabel, SpeechConsumer, SpeechQueue, Synthesizer,
    Transcriber, VoiceListener, WhisperStt,
};
use crate::{environment::VirtualEnvironment, Result};

/// The assembled companion daemon
pub struct Daemon {
    config: Config,
}

impl Daemon {
    /// Create a daemon from configuration
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run with every configured surface until ctrl-c
    ///
    /// # Errors
    ///
    /// Returns error if a required component cannot be built
    pub async fn run(self) -> Result<()> {
        let voice = self.config.voice.enabled;
        self.run_inner(voice).await
    }

    /// Run with only the terminal surface
    ///
    /// # Errors
    ///
    /// Returns error if a required component cannot be built
    pub async fn run_text_only(self) -> Result<()> {
        self.run_inner(false).await
    }

    async fn run_inner(self, voice: bool) -> Result<()> {
        let persona = Persona {
            name: self.config.persona.name.clone(),
            user_name: self.config.persona.user_name.clone(),
            wake_phrase: self.config.persona.wake_phrase.clone(),
            tts_voice: self.config.voice.tts_voice.clone(),
        };

        let store = KvStore::open(self.config.resolve_data_dir()?)?;
        tracing::info!(data_dir = %store.dir().display(), "memory store opened");

        let sched = Scheduler::new();
        let activity = ActivityTracker::new();
        let display: Arc<dyn DisplaySink> = Arc::new(ConsoleDisplay);
        let (speech, speech_rx) = SpeechQueue::new();
        let shared_mood = SharedMoodLabel::new("neutral");

        // Spoken output runs on its own thread; without voice the queue
        // drains into nothing
        let _speech_thread = if voice {
            let synthesizer: Arc<dyn Synthesizer> = Arc::new(OpenAiTts::new(
                self.config.api_keys.openai.clone(),
                persona.tts_voice.clone(),
                self.config.voice.tts_model.clone(),
            )?);
            let consumer = SpeechConsumer::new(
                speech_rx,
                synthesizer,
                SpeakingFlag::new(),
                shared_mood.clone(),
                tokio::runtime::Handle::current(),
            );
            Some(consumer.spawn())
        } else {
            drop(speech_rx);
            None
        };

        let generator: Arc<dyn Generator> = Arc::new(ChatCompletions::new(
            self.config.api_keys.openai.clone(),
            self.config.llm.base_url.clone(),
            self.config.llm.model.clone(),
            self.config.llm.max_tokens,
        )?);

        let notifier: Option<Arc<dyn Notifier>> = if self.config.api_keys.notify_webhook.is_empty()
        {
            None
        } else {
            Some(Arc::new(WebhookNotifier::new(
                self.config.api_keys.notify_webhook.clone(),
            )))
        };

        let followups = FollowUpScheduler::new(
            Arc::clone(&generator),
            persona.clone(),
            Arc::clone(&display),
            notifier,
            sched.clone(),
            activity.clone(),
        );

        let scripts_dir = self
            .config
            .scripts_dir
            .clone()
            .unwrap_or_else(|| store.dir().join("scripts"));
        let skills = SkillRegistry {
            weather: Some(WeatherSkill::new(self.config.weather_location.clone())),
            search: match SearchSkill::new(self.config.api_keys.brave.clone()) {
                Ok(search) => Some(search),
                Err(e) => {
                    tracing::info!(error = %e, "search skill disabled");
                    None
                }
            },
            timers: TimerSkill::new(
                sched.clone(),
                speech.clone(),
                Arc::clone(&display),
                persona.name.clone(),
                Some(store.clone()),
            ),
            calendar: CalendarSkill::load(store.clone())?,
            media: MediaSkill::detect(&self.config.media_player),
            scripts: ScriptSkill::new(scripts_dir),
        };

        let router = IntentRouter::spawn(RouterParts {
            generator,
            skills,
            splitter: Box::new(KeywordSplitter::new()),
            persona: persona.clone(),
            environment: VirtualEnvironment::new(),
            mood: MoodState::load(store.clone(), shared_mood)?,
            goals: GoalBook::load(store.clone())?,
            preferences: PreferenceTracker::load(store.clone())?,
            emotional: EmotionalMemory::load(store.clone())?,
            journal: Journal::load(store.clone())?,
            history: DialogueHistory::load(store)?,
            followups,
        });

        Self::spawn_terminal_surface(
            router.clone(),
            speech.clone(),
            Arc::clone(&display),
            activity.clone(),
            persona.name.clone(),
        );

        if voice {
            self.run_voice_loop(&persona, router, speech, display, activity, &sched)
                .await?;
        } else {
            tracing::info!("running text-only, ctrl-c to exit");
            tokio::signal::ctrl_c().await?;
            sched.shutdown();
        }

        tracing::info!("daemon stopped");
        Ok(())
    }

    /// Terminal lines go through the same router as voice commands
    fn spawn_terminal_surface(
        router: RouterHandle,
        speech: SpeechQueue,
        display: Arc<dyn DisplaySink>,
        activity: ActivityTracker,
        assistant_label: String,
    ) {
        tokio::spawn(async move {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut lines = stdin.lines();

            while let Ok(Some(line)) = lines.next_line().await {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                activity.touch();

                let response = router.handle(&line).await;
                if !response.trim().is_empty() {
                    display.line(&assistant_label, &response);
                    speech.say(response);
                }
            }
            tracing::debug!("terminal surface closed");
        });
    }

    /// Microphone capture and wake listening, on the root task
    async fn run_voice_loop(
        &self,
        persona: &Persona,
        router: RouterHandle,
        speech: SpeechQueue,
        display: Arc<dyn DisplaySink>,
        activity: ActivityTracker,
        sched: &Scheduler,
    ) -> Result<()> {
        let (mut capture, mut frames) = AudioCapture::new()?;
        capture.start()?;

        let transcriber: Arc<dyn Transcriber> = Arc::new(WhisperStt::new(
            self.config.api_keys.openai.clone(),
            self.config.voice.stt_model.clone(),
        )?);

        let listener = VoiceListener::new(
            ListenerConfig {
                wake_phrase: persona.wake_phrase.clone(),
                user_label: "You".to_string(),
                assistant_label: persona.name.clone(),
                ..ListenerConfig::default()
            },
            transcriber,
            router,
            speech,
            display,
            activity,
        );

        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
        {
            let sched = sched.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("ctrl-c received, shutting down");
                    sched.shutdown();
                    let _ = stop_tx.send(()).await;
                }
            });
        }

        listener.run(&mut frames, &mut stop_rx).await;
        capture.stop();
        Ok(())
    }
}

//! Ember - an always-listening spoken-conversation companion
//!
//! This library provides the core functionality for the Ember daemon:
//! - Continuous microphone capture and wake-phrase command capture
//! - Multi-intent command routing with contextual carry-over
//! - Serialized spoken playback of responses
//! - Persisted conversational memory (goals, preferences, moods, journal)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Surfaces                          │
//! │        Microphone        │        Terminal           │
//! └────────────┬─────────────┴───────────┬──────────────┘
//!              │                         │
//! ┌────────────▼─────────────┐           │
//! │  Listener (wake phrase,  │           │
//! │  command capture, STT)   │           │
//! └────────────┬─────────────┘           │
//!              └───────────┬─────────────┘
//! ┌────────────────────────▼────────────────────────────┐
//! │          Intent Router (single actor task)           │
//! │   skills │ memory │ persona prompts │ follow-ups    │
//! └────────────────────────┬────────────────────────────┘
//!                          │
//! ┌────────────────────────▼────────────────────────────┐
//! │        Speech Output Queue (TTS + playback)          │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod audio;
pub mod config;
pub mod daemon;
pub mod environment;
pub mod error;
pub mod followup;
pub mod llm;
pub mod memory;
pub mod notify;
pub mod persona;
pub mod router;
pub mod sched;
pub mod skills;
pub mod ui;
pub mod voice;

pub use config::Config;
pub use daemon::Daemon;
pub use error::{Error, Result};
pub use llm::Generator;
pub use memory::KvStore;
pub use notify::Notifier;
pub use persona::Persona;
pub use router::{IntentRouter, RouterHandle, FALLBACK_RESPONSE};
pub use sched::Scheduler;
pub use skills::SkillRegistry;
pub use ui::{ConsoleDisplay, DisplaySink, SpeakingFlag};
pub use voice::{Fidelity, MoodProfile, SpeechQueue, Synthesizer, Transcriber, VoiceListener};

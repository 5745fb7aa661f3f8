//! Wake-phrase listening and command capture
//!
//! A two-state machine over the microphone frame stream. In `Idle`, short
//! windows are run through quick transcription to spot the wake phrase. In
//! `Capturing`, frames accumulate into a session with a hard deadline, then
//! go through full transcription and the intent router. Wake detection and
//! command capture never run concurrently, and at most one capture session
//! exists at a time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::audio::{mean_abs_amplitude, SAMPLE_RATE};
use crate::router::{ActivityTracker, RouterHandle};
use crate::ui::DisplaySink;
use crate::voice::speech::SpeechQueue;
use crate::voice::stt::{Fidelity, Transcriber};

/// Acknowledgment spoken when the wake phrase is heard
pub const ACK_PHRASE: &str = "Yes?";

/// Spoken when a capture window ends with no audio at all
pub const MSG_NO_AUDIO: &str = "I didn't catch that.";

/// Spoken when captured audio is below the noise floor
pub const MSG_TOO_QUIET: &str = "It was too quiet, I couldn't hear you.";

/// Spoken when transcription yields nothing usable
pub const MSG_UNCLEAR: &str = "Sorry, I didn't understand that clearly.";

/// Spoken when the user closes the conversation
pub const MSG_CLOSING: &str = "Alright, I'm here when you need me.";

/// Trailing words that signal the user intends to keep talking
const CONTINUATION_MARKERS: [&str; 6] = ["and", "also", "then", "next", "too", "what about"];

/// Phrases that close the conversation
const CLOSING_PHRASES: [&str; 2] = ["thank you", "that's all"];

/// Check whether a transcript trails off with a continuation marker
#[must_use]
pub fn ends_with_continuation(text: &str) -> bool {
    let lower = text.to_lowercase();
    let trimmed = lower.trim_end_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace());
    CONTINUATION_MARKERS
        .iter()
        .any(|marker| trimmed.ends_with(marker))
}

/// Check whether a transcript contains a conversation-closing phrase
#[must_use]
pub fn contains_closing_phrase(text: &str) -> bool {
    let lower = text.to_lowercase();
    CLOSING_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

/// Listener tuning knobs
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Wake phrase, matched case-insensitively as a substring
    pub wake_phrase: String,
    /// Display label for the user
    pub user_label: String,
    /// Display label for the companion
    pub assistant_label: String,
    /// Hard deadline for a command-capture session
    pub command_timeout: Duration,
    /// Pause between wake acknowledgment and capture start
    pub settle_delay: Duration,
    /// Samples per quick wake-check window
    pub wake_window: usize,
    /// Mean-amplitude gate below which a wake window is skipped entirely
    pub quick_gate: f32,
    /// Mean-amplitude floor below which captured audio is discarded
    pub noise_floor: f32,
    /// Minimum words for a transcript to count as a command
    pub min_words: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            wake_phrase: "hey ember".to_string(),
            user_label: "You".to_string(),
            assistant_label: "Ember".to_string(),
            command_timeout: Duration::from_secs(10),
            settle_delay: Duration::from_secs(1),
            wake_window: SAMPLE_RATE as usize,
            quick_gate: 0.01,
            noise_floor: 0.001,
            min_words: 2,
        }
    }
}

/// Listener state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Watching frame windows for the wake phrase
    Idle,
    /// Accumulating a command-capture session
    Capturing,
}

/// How a finished capture session continues
enum SessionOutcome {
    /// Back to wake-phrase listening
    ReturnToIdle,
    /// Start another session without requiring the wake phrase
    ContinueCapturing,
}

/// Consumes microphone frames, detects the wake phrase, captures commands
pub struct VoiceListener {
    config: ListenerConfig,
    transcriber: Arc<dyn Transcriber>,
    router: RouterHandle,
    speech: SpeechQueue,
    display: Arc<dyn DisplaySink>,
    activity: ActivityTracker,
    state: ListenerState,
    window: Vec<f32>,
}

impl VoiceListener {
    /// Create a new listener
    #[must_use]
    pub fn new(
        config: ListenerConfig,
        transcriber: Arc<dyn Transcriber>,
        router: RouterHandle,
        speech: SpeechQueue,
        display: Arc<dyn DisplaySink>,
        activity: ActivityTracker,
    ) -> Self {
        let wake_phrase = config.wake_phrase.to_lowercase();
        Self {
            config: ListenerConfig {
                wake_phrase,
                ..config
            },
            transcriber,
            router,
            speech,
            display,
            activity,
            state: ListenerState::Idle,
            window: Vec::new(),
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> ListenerState {
        self.state
    }

    /// Run until the frame channel closes or shutdown is signalled
    ///
    /// Command handling is synchronous with respect to the frame stream: a
    /// slow router call means frames queue up rather than being processed in
    /// parallel.
    pub async fn run(
        mut self,
        frames: &mut mpsc::UnboundedReceiver<Vec<f32>>,
        shutdown: &mut mpsc::Receiver<()>,
    ) {
        tracing::info!(wake_phrase = %self.config.wake_phrase, "listening for wake phrase");

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("listener shutdown requested");
                    break;
                }
                frame = frames.recv() => {
                    let Some(frame) = frame else {
                        tracing::info!("frame source closed");
                        break;
                    };
                    self.on_idle_frame(frame, frames).await;
                }
            }
        }
    }

    /// Accumulate a wake-check window and test it for the wake phrase
    async fn on_idle_frame(
        &mut self,
        frame: Vec<f32>,
        frames: &mut mpsc::UnboundedReceiver<Vec<f32>>,
    ) {
        self.window.extend_from_slice(&frame);
        if self.window.len() < self.config.wake_window {
            return;
        }

        let window = std::mem::take(&mut self.window);

        // Silence never reaches the transcriber
        if mean_abs_amplitude(&window) < self.config.quick_gate {
            return;
        }

        let text = match self
            .transcriber
            .transcribe(&window, SAMPLE_RATE, Fidelity::Quick)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(error = %e, "quick transcription failed");
                return;
            }
        };

        if text.to_lowercase().contains(&self.config.wake_phrase) {
            tracing::info!(transcript = %text, "wake phrase detected");
            self.on_wake(frames).await;
        }
    }

    /// Acknowledge the wake phrase and run capture sessions until the
    /// conversation ends
    async fn on_wake(&mut self, frames: &mut mpsc::UnboundedReceiver<Vec<f32>>) {
        self.speech.say(ACK_PHRASE);
        self.activity.touch();

        // Frames queued before the acknowledgment are stale pre-wake audio
        drain_frames(frames);
        tokio::time::sleep(self.config.settle_delay).await;

        self.state = ListenerState::Capturing;

        loop {
            let outcome = self.capture_session(frames).await;
            match outcome {
                SessionOutcome::ContinueCapturing => {
                    tracing::debug!("continuation marker, capturing again");
                }
                SessionOutcome::ReturnToIdle => break,
            }
        }

        self.state = ListenerState::Idle;
        self.window.clear();
    }

    /// Accumulate one capture session up to the deadline, then resolve it
    async fn capture_session(
        &mut self,
        frames: &mut mpsc::UnboundedReceiver<Vec<f32>>,
    ) -> SessionOutcome {
        let deadline = tokio::time::Instant::now() + self.config.command_timeout;
        let mut samples: Vec<f32> = Vec::new();

        loop {
            let now = tokio::time::Instant::now();
            if now >= deadline {
                break;
            }

            match tokio::time::timeout_at(deadline, frames.recv()).await {
                Ok(Some(frame)) => samples.extend_from_slice(&frame),
                Ok(None) => break,
                Err(_) => break,
            }
        }

        self.resolve_session(samples).await
    }

    /// Apply the post-capture checks and route the transcript
    async fn resolve_session(&mut self, samples: Vec<f32>) -> SessionOutcome {
        if samples.is_empty() {
            self.speech.say(MSG_NO_AUDIO);
            return SessionOutcome::ReturnToIdle;
        }

        // Deliberate short-circuit: too-quiet audio is discarded without
        // ever reaching the transcriber
        if mean_abs_amplitude(&samples) < self.config.noise_floor {
            self.speech.say(MSG_TOO_QUIET);
            return SessionOutcome::ReturnToIdle;
        }

        let text = match self
            .transcriber
            .transcribe(&samples, SAMPLE_RATE, Fidelity::Full)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "full transcription failed");
                String::new()
            }
        };

        if text.is_empty() || text.split_whitespace().count() < self.config.min_words {
            self.speech.say(MSG_UNCLEAR);
            return SessionOutcome::ReturnToIdle;
        }

        if ends_with_continuation(&text) {
            self.route_command(&text).await;
            return SessionOutcome::ContinueCapturing;
        }

        if contains_closing_phrase(&text) {
            self.route_command(&text).await;
            self.speech.say(MSG_CLOSING);
            return SessionOutcome::ReturnToIdle;
        }

        self.route_command(&text).await;
        SessionOutcome::ReturnToIdle
    }

    /// Send a transcript through the router; display and speak the response
    async fn route_command(&mut self, text: &str) {
        self.display.line(&self.config.user_label, text);
        self.activity.touch();

        let response = self.router.handle(text).await;
        if !response.trim().is_empty() {
            self.display.line(&self.config.assistant_label, &response);
            self.speech.say(response);
        }
    }
}

/// Discard everything currently queued on the frame channel
fn drain_frames(frames: &mut mpsc::UnboundedReceiver<Vec<f32>>) {
    while frames.try_recv().is_ok() {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continuation_markers() {
        assert!(ends_with_continuation("play some jazz and"));
        assert!(ends_with_continuation("Set a timer, then"));
        assert!(ends_with_continuation("turn it up too."));
        assert!(ends_with_continuation("what about"));
        assert!(!ends_with_continuation("play some jazz"));
        assert!(!ends_with_continuation("band practice"));
    }

    #[test]
    fn test_closing_phrases() {
        assert!(contains_closing_phrase("Thank you so much"));
        assert!(contains_closing_phrase("that's all for now"));
        assert!(!contains_closing_phrase("thanks a lot"));
    }
}

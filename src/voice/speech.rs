//! Speech output queue
//!
//! All outgoing speech is serialized through one unbounded FIFO with a
//! single consumer on a dedicated thread (cpal streams are not `Send`).
//! Order is strictly enqueue order; there is no priority lane.

use std::io::Write;
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;

use crate::audio::AudioPlayback;
use crate::ui::SpeakingFlag;
use crate::voice::tts::{profile_for_mood, Synthesizer};

/// Maximum characters sent to synthesis; longer text is truncated
const MAX_SPOKEN_CHARS: usize = 500;

/// Poll interval while waiting for an in-progress utterance to finish
const SPEAKING_POLL: std::time::Duration = std::time::Duration::from_millis(100);

/// Current mood label shared between the router (writer) and the speech
/// consumer (reader), used to pick a synthesis profile at dequeue time
#[derive(Clone, Default)]
pub struct SharedMoodLabel(Arc<RwLock<String>>);

impl SharedMoodLabel {
    /// Create a label holder with the given initial mood
    #[must_use]
    pub fn new(label: &str) -> Self {
        Self(Arc::new(RwLock::new(label.to_string())))
    }

    /// Read the current mood label
    #[must_use]
    pub fn get(&self) -> String {
        self.0.read().map(|l| l.clone()).unwrap_or_default()
    }

    /// Replace the current mood label
    pub fn set(&self, label: &str) {
        if let Ok(mut l) = self.0.write() {
            *l = label.to_string();
        }
    }
}

/// Producer handle for the speech output queue
#[derive(Clone)]
pub struct SpeechQueue {
    tx: mpsc::UnboundedSender<String>,
}

impl SpeechQueue {
    /// Create the queue, returning the producer handle and consumer end
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Enqueue text for spoken playback
    ///
    /// Never blocks; if the consumer is gone the text is dropped with a log.
    pub fn say(&self, text: impl Into<String>) {
        let text = text.into();
        if self.tx.send(text).is_err() {
            tracing::warn!("speech consumer gone, dropping utterance");
        }
    }
}

/// Strip markup and cap length before synthesis
///
/// Removes `<...>` tags and `*`, `_`, `$` characters; truncates to
/// [`MAX_SPOKEN_CHARS`] with a trailing ellipsis.
#[must_use]
pub fn sanitize_for_speech(text: &str) -> String {
    static TAG_RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    let tag_re = TAG_RE.get_or_init(|| regex::Regex::new(r"<[^>]*>").expect("valid regex"));

    let stripped = tag_re.replace_all(text, "");
    let mut cleaned: String = stripped
        .chars()
        .filter(|c| !matches!(c, '*' | '_' | '$'))
        .collect();

    if cleaned.chars().count() > MAX_SPOKEN_CHARS {
        cleaned = cleaned.chars().take(MAX_SPOKEN_CHARS).collect::<String>() + "...";
    }

    cleaned
}

/// Single consumer that drains the speech queue sequentially
pub struct SpeechConsumer {
    rx: mpsc::UnboundedReceiver<String>,
    synthesizer: Arc<dyn Synthesizer>,
    speaking: SpeakingFlag,
    mood: SharedMoodLabel,
    runtime: tokio::runtime::Handle,
}

impl SpeechConsumer {
    /// Create a consumer for the given queue receiver
    #[must_use]
    pub fn new(
        rx: mpsc::UnboundedReceiver<String>,
        synthesizer: Arc<dyn Synthesizer>,
        speaking: SpeakingFlag,
        mood: SharedMoodLabel,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        Self {
            rx,
            synthesizer,
            speaking,
            mood,
            runtime,
        }
    }

    /// Spawn the consumer on its own OS thread
    ///
    /// The thread exits when every producer handle has been dropped.
    pub fn spawn(self) -> std::thread::JoinHandle<()> {
        std::thread::Builder::new()
            .name("speech-output".to_string())
            .spawn(move || self.run())
            .expect("failed to spawn speech output thread")
    }

    fn run(mut self) {
        let playback = match AudioPlayback::new() {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::error!(error = %e, "audio playback unavailable, speech will be dropped");
                None
            }
        };

        while let Some(text) = self.rx.blocking_recv() {
            if text.trim().is_empty() {
                continue;
            }

            // Another producer may be mid-utterance (e.g. an external UI);
            // poll and retry rather than speak over it.
            wait_until_quiet(&self.speaking);

            let Some(playback) = playback.as_ref() else {
                continue;
            };

            if let Err(e) = self.speak_one(playback, &text) {
                tracing::warn!(error = %e, "speech output failed, continuing");
            }
        }

        tracing::debug!("speech output queue closed");
    }

    /// Synthesize and play one utterance
    ///
    /// The synthesized audio lands in a temp file that is removed on every
    /// exit path when the handle drops.
    fn speak_one(&self, playback: &AudioPlayback, text: &str) -> crate::Result<()> {
        let cleaned = sanitize_for_speech(text);
        if cleaned.trim().is_empty() {
            return Ok(());
        }

        let mood = self.mood.get();
        let profile = profile_for_mood(&mood);
        tracing::debug!(mood = %mood, rate = profile.rate, pitch = profile.pitch, "synthesizing");

        let mp3 = self
            .runtime
            .block_on(self.synthesizer.synthesize(&cleaned, profile))?;

        let mut voice_file = tempfile::NamedTempFile::new()?;
        voice_file.write_all(&mp3)?;
        voice_file.flush()?;

        let audio = std::fs::read(voice_file.path())?;

        self.speaking.set(true);
        let result = playback.play_mp3(&audio);
        self.speaking.set(false);

        result
    }
}

/// Block until no utterance is in flight; runs before every synthesis call
fn wait_until_quiet(speaking: &SpeakingFlag) {
    while speaking.is_speaking() {
        std::thread::sleep(SPEAKING_POLL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_markup() {
        assert_eq!(sanitize_for_speech("hello <b>world</b>"), "hello world");
        assert_eq!(sanitize_for_speech("a *b* _c_ $d$"), "a b c d");
        assert_eq!(sanitize_for_speech("plain"), "plain");
    }

    #[test]
    fn test_sanitize_caps_length() {
        let long = "x".repeat(MAX_SPOKEN_CHARS + 50);
        let out = sanitize_for_speech(&long);
        assert_eq!(out.chars().count(), MAX_SPOKEN_CHARS + 3);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn test_shared_mood_label() {
        let mood = SharedMoodLabel::new("neutral");
        assert_eq!(mood.get(), "neutral");

        let writer = mood.clone();
        writer.set("playful");
        assert_eq!(mood.get(), "playful");
    }

    #[test]
    fn test_holds_while_speaking_flag_set() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let flag = SpeakingFlag::new();
        flag.set(true);

        let passed_gate = Arc::new(AtomicBool::new(false));
        let waiter = {
            let flag = flag.clone();
            let passed_gate = Arc::clone(&passed_gate);
            std::thread::spawn(move || {
                wait_until_quiet(&flag);
                passed_gate.store(true, Ordering::SeqCst);
            })
        };

        // Half a poll interval in, the gate must still be holding
        std::thread::sleep(SPEAKING_POLL / 2);
        assert!(!passed_gate.load(Ordering::SeqCst));

        flag.set(false);
        waiter.join().unwrap();
        assert!(passed_gate.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_queue_preserves_order() {
        let (queue, mut rx) = SpeechQueue::new();
        queue.say("first");
        queue.say("second");
        queue.say("third");

        assert_eq!(rx.recv().await.unwrap(), "first");
        assert_eq!(rx.recv().await.unwrap(), "second");
        assert_eq!(rx.recv().await.unwrap(), "third");
    }
}

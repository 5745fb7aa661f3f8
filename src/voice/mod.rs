//! Voice pipeline: transcription, synthesis, speech output, wake listening

mod listener;
mod speech;
mod stt;
mod tts;

pub use listener::{
    contains_closing_phrase, ends_with_continuation, ListenerConfig, ListenerState, VoiceListener,
    ACK_PHRASE, MSG_CLOSING, MSG_NO_AUDIO, MSG_TOO_QUIET, MSG_UNCLEAR,
};
pub use speech::{sanitize_for_speech, SpeechConsumer, SpeechQueue, SharedMoodLabel};
pub use stt::{Fidelity, Transcriber, WhisperStt};
pub use tts::{profile_for_mood, MoodProfile, OpenAiTts, Synthesizer};

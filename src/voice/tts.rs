//! Text-to-speech (TTS) processing
//!
//! Synthesis is parameterized by a mood profile so the voice tracks the
//! companion's current tone.

use async_trait::async_trait;

use crate::{Error, Result};

/// Synthesis parameters selected by mood
///
/// `rate` is a speed multiplier around 1.0; `pitch` a semitone-ish offset.
/// Backends that cannot express pitch carry it for ones that can.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoodProfile {
    /// Speaking-rate multiplier
    pub rate: f32,
    /// Pitch offset in Hz
    pub pitch: f32,
}

impl Default for MoodProfile {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 0.0,
        }
    }
}

/// Look up the synthesis profile for a mood label
///
/// Unmapped labels get the default profile.
#[must_use]
pub fn profile_for_mood(mood: &str) -> MoodProfile {
    match mood {
        "soft" => MoodProfile {
            rate: 0.9,
            pitch: -2.0,
        },
        "playful" => MoodProfile {
            rate: 1.15,
            pitch: 5.0,
        },
        "affectionate" => MoodProfile {
            rate: 1.05,
            pitch: 2.0,
        },
        "serious" => MoodProfile {
            rate: 0.95,
            pitch: -1.0,
        },
        _ => MoodProfile::default(),
    }
}

/// Synthesizes speech from text
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize text to playable MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    async fn synthesize(&self, text: &str, profile: MoodProfile) -> Result<Vec<u8>>;
}

/// Synthesizes speech via the OpenAI TTS API
pub struct OpenAiTts {
    client: reqwest::Client,
    api_key: String,
    voice: String,
    model: String,
}

impl OpenAiTts {
    /// Create a new OpenAI TTS instance
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(api_key: String, voice: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice,
            model,
        })
    }
}

#[async_trait]
impl Synthesizer for OpenAiTts {
    async fn synthesize(&self, text: &str, profile: MoodProfile) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        // OpenAI TTS has no pitch control; the profile rate maps to speed
        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: profile.rate.clamp(0.25, 4.0),
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_lookup() {
        assert!(profile_for_mood("playful").rate > 1.0);
        assert!(profile_for_mood("soft").rate < 1.0);
        assert_eq!(profile_for_mood("neutral"), MoodProfile::default());
        assert_eq!(profile_for_mood(""), MoodProfile::default());
    }
}

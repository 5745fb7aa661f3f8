//! Speech-to-text (STT) processing

use async_trait::async_trait;

use crate::audio::samples_to_wav;
use crate::{Error, Result};

/// Transcription fidelity
///
/// `Quick` is used only for wake-phrase checks over short windows; `Full`
/// for captured command audio.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fidelity {
    /// Cheap, short-window pass for wake detection
    Quick,
    /// Full-quality pass for command transcription
    Full,
}

/// Converts PCM audio to text
///
/// An empty transcript means "no speech detected", never an error.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe audio samples to text
    ///
    /// # Errors
    ///
    /// Returns error if the transcription backend fails
    async fn transcribe(
        &self,
        samples: &[f32],
        sample_rate: u32,
        fidelity: Fidelity,
    ) -> Result<String>;
}

/// Response from OpenAI Whisper transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Transcribes speech via the OpenAI Whisper API
pub struct WhisperStt {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl WhisperStt {
    /// Create a new Whisper STT instance
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for Whisper".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        })
    }
}

#[async_trait]
impl Transcriber for WhisperStt {
    async fn transcribe(
        &self,
        samples: &[f32],
        sample_rate: u32,
        fidelity: Fidelity,
    ) -> Result<String> {
        let audio = samples_to_wav(samples, sample_rate)?;

        tracing::debug!(
            audio_bytes = audio.len(),
            ?fidelity,
            "starting Whisper transcription"
        );

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio)
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone());

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Whisper request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Whisper API error");
            return Err(Error::Stt(format!("Whisper API error {status}: {body}")));
        }

        let result: WhisperResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse Whisper response");
            e
        })?;

        let text = result.text.trim().to_string();
        if matches!(fidelity, Fidelity::Full) {
            tracing::info!(transcript = %text, "transcription complete");
        }
        Ok(text)
    }
}

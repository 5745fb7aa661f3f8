//! Configuration loading
//!
//! Layered: built-in defaults, then an optional `ember.toml`, then
//! environment variables for secrets. Every field has a sensible default
//! so a bare `ember` run works with nothing but an API key in the
//! environment.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

const CONFIG_FILE: &str = "ember.toml";

/// Companion identity settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    /// Companion's name
    pub name: String,
    /// What the companion calls the user
    pub user_name: String,
    /// Spoken wake phrase
    pub wake_phrase: String,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: "Ember".to_string(),
            user_name: "friend".to_string(),
            wake_phrase: "hey ember".to_string(),
        }
    }
}

/// Voice pipeline settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Whether the microphone surface runs at all
    pub enabled: bool,
    /// Transcription model
    pub stt_model: String,
    /// Synthesis model
    pub tts_model: String,
    /// Synthesis voice
    pub tts_voice: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stt_model: "whisper-1".to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "nova".to_string(),
        }
    }
}

/// API credentials, usually supplied through the environment
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiKeysConfig {
    /// OpenAI key, used for STT, TTS, and generation
    pub openai: String,
    /// Brave Search key; empty disables the search skill
    pub brave: String,
    /// Webhook URL for idle notifications; empty disables them
    pub notify_webhook: String,
}

/// Text generation settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible API base URL
    pub base_url: String,
    /// Chat model
    pub model: String,
    /// Completion token cap
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 120,
        }
    }
}

/// Full daemon configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Companion identity
    pub persona: PersonaConfig,
    /// Voice pipeline
    pub voice: VoiceConfig,
    /// Credentials
    pub api_keys: ApiKeysConfig,
    /// Text generation
    pub llm: LlmConfig,
    /// Where memory files live; defaults to the platform data directory
    pub data_dir: Option<PathBuf>,
    /// Media player binary name
    pub media_player: String,
    /// Fixed weather location; unset means IP geolocation
    pub weather_location: Option<String>,
    /// Directory of user scripts
    pub scripts_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration, optionally from an explicit file path
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match Self::config_path(path) {
            Some(file) if file.exists() => {
                tracing::debug!(path = %file.display(), "loading config file");
                let contents = std::fs::read_to_string(&file)?;
                toml::from_str(&contents)?
            }
            _ => Self::default(),
        };

        if config.media_player.is_empty() {
            config.media_player = "mpv".to_string();
        }
        config.apply_env();
        Ok(config)
    }

    /// Environment variables win over the file for secrets and overrides
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.api_keys.openai = key;
        }
        if let Ok(key) = std::env::var("BRAVE_API_KEY") {
            self.api_keys.brave = key;
        }
        if let Ok(url) = std::env::var("EMBER_NOTIFY_WEBHOOK") {
            self.api_keys.notify_webhook = url;
        }
        if let Ok(url) = std::env::var("EMBER_LLM_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("EMBER_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Ok(dir) = std::env::var("EMBER_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
    }

    fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        // Current directory first, then the platform config directory
        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }
        directories::ProjectDirs::from("", "", "ember")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Resolve the memory data directory
    ///
    /// # Errors
    ///
    /// Returns error if no platform data directory can be determined
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        directories::ProjectDirs::from("", "", "ember")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| Error::Config("could not determine a data directory".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.persona.name, "Ember");
        assert_eq!(config.persona.wake_phrase, "hey ember");
        assert!(config.voice.enabled);
        assert_eq!(config.llm.max_tokens, 120);
    }

    #[test]
    fn test_parse_partial_file() {
        let toml = r#"
            [persona]
            name = "Ash"

            [llm]
            model = "gpt-4o"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.persona.name, "Ash");
        assert_eq!(config.persona.user_name, "friend");
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ember.toml");
        std::fs::write(&path, "[voice]\nenabled = false\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert!(!config.voice.enabled);
        assert_eq!(config.media_player, "mpv");
    }
}

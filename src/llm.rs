//! Language model client
//!
//! One trait at the generation seam so the router and follow-up scheduler
//! can be tested with scripted backends, plus a chat-completions client for
//! any OpenAI-compatible endpoint.

use async_trait::async_trait;

use crate::{Error, Result};

/// Generates a response from a system prompt and user message
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a completion
    ///
    /// # Errors
    ///
    /// Returns error if the backend request fails or yields no choices
    async fn generate(&self, system: &str, user: &str) -> Result<String>;
}

#[derive(serde::Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(serde::Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(serde::Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Chat-completions client for OpenAI-compatible APIs
pub struct ChatCompletions {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl ChatCompletions {
    /// Create a new chat-completions client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String, base_url: String, model: String, max_tokens: u32) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "API key required for text generation".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            max_tokens,
        })
    }
}

#[async_trait]
impl Generator for ChatCompletions {
    async fn generate(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "chat completion failed");
            return Err(Error::Generation(format!(
                "chat completion error {status}: {body}"
            )));
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Generation("chat completion returned no choices".to_string()))?;

        Ok(content.trim().to_string())
    }
}

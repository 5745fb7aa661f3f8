//! Outbound notifications
//!
//! Used when the companion wants attention while the user has been idle,
//! e.g. a proactive follow-up question surfaced to a webhook.

use async_trait::async_trait;

use crate::Result;

/// Delivers a short message to an external channel
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification
    ///
    /// # Errors
    ///
    /// Returns error if delivery fails
    async fn notify(&self, message: &str) -> Result<()>;
}

/// Posts notifications to a webhook as a JSON `{"text": ...}` payload
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    /// Create a notifier for the given webhook URL
    #[must_use]
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        #[derive(serde::Serialize)]
        struct Payload<'a> {
            text: &'a str,
        }

        self.client
            .post(&self.url)
            .json(&Payload { text: message })
            .send()
            .await?
            .error_for_status()?;

        tracing::debug!("notification delivered");
        Ok(())
    }
}

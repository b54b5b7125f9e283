//! Discord webhook channel — posts to an incoming-webhook URL.
//!
//! Needs no bot account or guild lookup; the URL alone identifies the
//! destination channel.

use async_trait::async_trait;
use drivewatch_core::error::{DriveWatchError, Result};
use drivewatch_core::traits::Channel;
use drivewatch_core::types::OutgoingMessage;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Webhook channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// URL to send outbound messages to.
    pub url: String,
    /// Display name override for posted messages.
    pub username: Option<String>,
}

/// Webhook channel.
pub struct WebhookChannel {
    config: WebhookConfig,
    client: reqwest::Client,
    connected: bool,
}

impl WebhookChannel {
    pub fn new(config: WebhookConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DriveWatchError::Http(format!("Webhook client init failed: {e}")))?;
        Ok(Self { config, client, connected: false })
    }

    fn payload(&self, content: &str) -> serde_json::Value {
        let mut body = serde_json::json!({ "content": content });
        if let Some(name) = &self.config.username {
            body["username"] = serde_json::Value::String(name.clone());
        }
        body
    }
}

#[async_trait]
impl Channel for WebhookChannel {
    fn name(&self) -> &str { "webhook" }

    async fn connect(&mut self) -> Result<()> {
        if !self.config.url.starts_with("https://") && !self.config.url.starts_with("http://") {
            return Err(DriveWatchError::config(format!("Invalid webhook URL: {}", self.config.url)));
        }
        self.connected = true;
        tracing::info!("Webhook channel connected");
        Ok(())
    }

    fn is_connected(&self) -> bool { self.connected }

    async fn send(&self, message: OutgoingMessage) -> Result<()> {
        let response = self.client.post(&self.config.url)
            .json(&self.payload(&message.content))
            .send()
            .await
            .map_err(|e| DriveWatchError::Channel(format!("Webhook send failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(crate::status_error("Webhook", status, &text));
        }
        Ok(())
    }
}

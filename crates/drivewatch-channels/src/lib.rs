//! # DriveWatch Channels
//! Chat destinations for new-item notifications.

pub mod console;
pub mod discord;
pub mod webhook;

use drivewatch_core::config::{ChatBackend, ChatConfig};
use drivewatch_core::error::{DriveWatchError, Result};
use drivewatch_core::traits::Channel;
use std::time::Duration;

pub use console::ConsoleChannel;
pub use discord::{DiscordChannel, DiscordConfig};
pub use webhook::{WebhookChannel, WebhookConfig};

/// Classify a non-success chat API response. Rate limits and server errors
/// may clear up; any other 4xx means the message will never be accepted.
pub(crate) fn status_error(what: &str, status: reqwest::StatusCode, body: &str) -> DriveWatchError {
    let msg = format!("{what} {status}: {body}");
    if status.is_client_error() && status != reqwest::StatusCode::TOO_MANY_REQUESTS {
        DriveWatchError::rejected(msg)
    } else {
        DriveWatchError::channel(msg)
    }
}

/// Create a chat channel from configuration. The channel is not yet connected.
pub fn create_channel(config: &ChatConfig, timeout: Duration) -> Result<Box<dyn Channel>> {
    match config.backend {
        ChatBackend::Discord => Ok(Box::new(DiscordChannel::new(
            DiscordConfig {
                bot_token: config.bot_token.clone(),
                guild_id: config.guild_id.clone(),
                channel_id: config.channel_id.clone(),
            },
            timeout,
        )?)),
        ChatBackend::Webhook => Ok(Box::new(WebhookChannel::new(
            WebhookConfig { url: config.webhook_url.clone(), username: None },
            timeout,
        )?)),
        ChatBackend::Console => Ok(Box::new(ConsoleChannel::new())),
    }
}

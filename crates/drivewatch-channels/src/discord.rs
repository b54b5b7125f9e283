//! Discord Bot channel — REST API only.
//!
//! Notifications are one-way, so no Gateway session is opened; `connect`
//! checks that the bot can see the configured guild and that the target
//! channel belongs to it.

use async_trait::async_trait;
use drivewatch_core::error::{DriveWatchError, Result};
use drivewatch_core::traits::Channel;
use drivewatch_core::types::OutgoingMessage;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_BASE: &str = "https://discord.com/api/v10";

/// Discord channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub bot_token: String,
    pub guild_id: String,
    pub channel_id: String,
}

/// Discord Bot channel.
pub struct DiscordChannel {
    config: DiscordConfig,
    client: reqwest::Client,
    api_base: String,
    connected: bool,
}

impl DiscordChannel {
    pub fn new(config: DiscordConfig, timeout: Duration) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        let auth = reqwest::header::HeaderValue::from_str(&format!("Bot {}", config.bot_token))
            .map_err(|e| DriveWatchError::config(format!("Invalid Discord bot token: {e}")))?;
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("DriveWatch/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| DriveWatchError::Http(format!("Discord client init failed: {e}")))?;

        Ok(Self { config, client, api_base: API_BASE.into(), connected: false })
    }

    /// Send a message to a channel.
    pub async fn send_message(&self, channel_id: &str, content: &str) -> Result<()> {
        let url = format!("{}/channels/{channel_id}/messages", self.api_base);
        let body = serde_json::json!({ "content": content });

        let response = self.client.post(&url).json(&body).send().await
            .map_err(|e| DriveWatchError::Channel(format!("Discord send failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(crate::status_error("Discord", status, &text));
        }
        Ok(())
    }

    /// Get current bot info.
    pub async fn get_me(&self) -> Result<DiscordUser> {
        self.get_json(&format!("{}/users/@me", self.api_base), "getMe").await
    }

    pub async fn get_guild(&self, guild_id: &str) -> Result<DiscordGuild> {
        self.get_json(&format!("{}/guilds/{guild_id}", self.api_base), "getGuild").await
            .map_err(|e| DriveWatchError::config(format!("Bot is not in guild with ID {guild_id}: {e}")))
    }

    pub async fn get_channel(&self, channel_id: &str) -> Result<DiscordChannelInfo> {
        self.get_json(&format!("{}/channels/{channel_id}", self.api_base), "getChannel").await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        let response = self.client.get(url).send().await
            .map_err(|e| DriveWatchError::Channel(format!("{what} failed: {e}")))?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(crate::status_error(what, status, &text));
        }
        response.json().await
            .map_err(|e| DriveWatchError::Channel(format!("Invalid {what} response: {e}")))
    }
}

/// A refused `getMe` means the token itself is bad, which is a setup problem.
fn token_error(e: DriveWatchError) -> DriveWatchError {
    match e {
        DriveWatchError::ChannelRejected(msg) => {
            DriveWatchError::config(format!("Discord rejected the bot token: {msg}"))
        }
        other => other,
    }
}

/// The target channel must exist and live inside the configured guild.
fn check_channel_in_guild(channel: &DiscordChannelInfo, guild: &DiscordGuild) -> Result<()> {
    match channel.guild_id.as_deref() {
        Some(id) if id == guild.id => Ok(()),
        _ => Err(DriveWatchError::config(format!(
            "Channel with ID {} not found in guild {}", channel.id, guild.name
        ))),
    }
}

#[async_trait]
impl Channel for DiscordChannel {
    fn name(&self) -> &str { "discord" }

    async fn connect(&mut self) -> Result<()> {
        let me = self.get_me().await.map_err(token_error)?;
        tracing::info!("Discord bot connected: {} ({})", me.username, me.id);

        let guild = self.get_guild(&self.config.guild_id).await?;
        tracing::info!("Bot is in guild: {} ({})", guild.name, guild.id);

        let channel = self.get_channel(&self.config.channel_id).await
            .map_err(|e| DriveWatchError::config(format!(
                "Channel with ID {} not found: {e}", self.config.channel_id
            )))?;
        check_channel_in_guild(&channel, &guild)?;

        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool { self.connected }

    async fn send(&self, message: OutgoingMessage) -> Result<()> {
        let target = if message.thread_id.is_empty() {
            self.config.channel_id.as_str()
        } else {
            message.thread_id.as_str()
        };
        self.send_message(target, &message.content).await
    }
}

// --- Discord API Types ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
    pub bot: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordGuild {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordChannelInfo {
    pub id: String,
    pub guild_id: Option<String>,
    pub name: Option<String>,
}

//! DriveWatch configuration — `~/.drivewatch/config.toml` plus env overrides.
//!
//! ```toml
//! [chat]
//! backend = "discord"
//! channel_id = "123"
//! guild_id = "456"
//! mention_role_id = "789"
//!
//! [scan]
//! interval_secs = 10800
//!
//! [[sources]]
//! name = "Sofia [Model Content Upload]"
//! root_id = "1MBUfAv_..."
//! mode = "deep"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{DriveWatchError, Result};
use crate::types::SourceConfig;
use crate::types::source::MAX_DELAY_SECS;

const MASK: &str = "***";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriveWatchConfig {
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub drive: DriveConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

/// Which chat integration delivers notifications.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatBackend {
    #[default]
    Discord,
    Webhook,
    /// Log notifications instead of posting them.
    Console,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default)]
    pub backend: ChatBackend,
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub guild_id: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub webhook_url: String,
    /// Role mentioned at the start of every announcement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mention_role_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    /// OAuth bearer token for the Drive API.
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_drive_api_url")]
    pub api_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            api_url: default_drive_api_url(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Pause between full passes over all sources.
    #[serde(default = "default_scan_interval")]
    pub interval_secs: u64,
    /// How often the delay queue is checked for due notifications.
    #[serde(default = "default_dispatch_interval")]
    pub dispatch_interval_secs: u64,
    /// Upper bound on every provider and chat HTTP call.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_scan_interval(),
            dispatch_interval_secs: default_dispatch_interval(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ScanConfig {
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_secs)
    }

    pub fn dispatch_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.dispatch_interval_secs)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DedupBackend {
    /// In-process set; every item is announced again after a restart.
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    #[serde(default)]
    pub backend: DedupBackend,
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self { backend: DedupBackend::default(), path: default_db_path() }
    }
}

impl DedupConfig {
    /// Database path with `~` and env vars expanded.
    pub fn resolved_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::full(&self.path).map(|p| p.into_owned()).unwrap_or_else(|_| self.path.clone()))
    }
}

fn default_drive_api_url() -> String { "https://www.googleapis.com/drive/v3".into() }
fn default_page_size() -> u32 { 1000 }
fn default_scan_interval() -> u64 { 3 * 60 * 60 }
fn default_dispatch_interval() -> u64 { 10 * 60 }
fn default_request_timeout() -> u64 { 30 }
fn default_db_path() -> String { "~/.drivewatch/seen.db".into() }

impl DriveWatchConfig {
    /// `~/.drivewatch`
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".drivewatch")
    }

    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Load from the default path, then apply env overrides.
    /// A missing file yields defaults, so a purely env-driven deploy works.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        let mut config = if path.exists() {
            Self::read_file(&path)?
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Load from an explicit path, then apply env overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DriveWatchError::ConfigNotFound(path.display().to_string()));
        }
        let mut config = Self::read_file(path)?;
        config.apply_env();
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| DriveWatchError::config(format!("Invalid config: {e}")))
    }

    /// Overlay `BOT_TOKEN`, `GUILD_ID`, `CHANNEL_ID`, `DISCORD_WEBHOOK_URL`
    /// and `DRIVE_ACCESS_TOKEN` from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = get("BOT_TOKEN") { self.chat.bot_token = v; }
        if let Some(v) = get("GUILD_ID") { self.chat.guild_id = v; }
        if let Some(v) = get("CHANNEL_ID") { self.chat.channel_id = v; }
        if let Some(v) = get("DISCORD_WEBHOOK_URL") { self.chat.webhook_url = v; }
        if let Some(v) = get("DRIVE_ACCESS_TOKEN") { self.drive.access_token = v; }
    }

    /// Check everything the watcher needs before any task starts.
    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(DriveWatchError::config("No sources configured"));
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(DriveWatchError::config(format!("Source with root '{}' has no name", source.root_id)));
            }
            if source.root_id.trim().is_empty() {
                return Err(DriveWatchError::config(format!("Source '{}' has no root_id", source.name)));
            }
            if source.delay_secs.is_some_and(|d| d > MAX_DELAY_SECS) {
                return Err(DriveWatchError::config(format!(
                    "Source '{}' delay exceeds {MAX_DELAY_SECS}s", source.name
                )));
            }
            if !names.insert(source.name.as_str()) {
                return Err(DriveWatchError::config(format!("Duplicate source name '{}'", source.name)));
            }
        }

        match self.chat.backend {
            ChatBackend::Discord => {
                if self.chat.bot_token.is_empty() {
                    return Err(DriveWatchError::config("Discord bot token missing (BOT_TOKEN)"));
                }
                if self.chat.guild_id.is_empty() {
                    return Err(DriveWatchError::config("Discord guild id missing (GUILD_ID)"));
                }
                if self.chat.channel_id.is_empty() {
                    return Err(DriveWatchError::config("Discord channel id missing (CHANNEL_ID)"));
                }
            }
            ChatBackend::Webhook => {
                if self.chat.webhook_url.is_empty() {
                    return Err(DriveWatchError::config("Webhook URL missing (DISCORD_WEBHOOK_URL)"));
                }
            }
            ChatBackend::Console => {}
        }

        if self.drive.access_token.is_empty() {
            return Err(DriveWatchError::config("Drive access token missing (DRIVE_ACCESS_TOKEN)"));
        }
        if self.scan.interval_secs == 0 || self.scan.dispatch_interval_secs == 0 {
            return Err(DriveWatchError::config("Scan and dispatch intervals must be non-zero"));
        }
        Ok(())
    }

    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Copy with credentials replaced, for display.
    pub fn masked(&self) -> Self {
        let mut copy = self.clone();
        for secret in [
            &mut copy.chat.bot_token,
            &mut copy.chat.webhook_url,
            &mut copy.drive.access_token,
        ] {
            if !secret.is_empty() {
                *secret = MASK.into();
            }
        }
        copy
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| DriveWatchError::config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScanMode;

    const SAMPLE: &str = r#"
[chat]
backend = "discord"
bot_token = "tok"
guild_id = "1"
channel_id = "2"
mention_role_id = "1467928994665205811"

[drive]
access_token = "ya29"

[scan]
interval_secs = 5

[dedup]
backend = "sqlite"
path = "/tmp/seen.db"

[[sources]]
name = "Sofia"
root_id = "abc"

[[sources]]
name = "Heather [PPV Upload]"
root_id = "def"
mode = "shallow"
delay_secs = 86400
"#;

    #[test]
    fn test_parse_sample() {
        let config = DriveWatchConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[1].mode, ScanMode::Shallow);
        assert_eq!(config.scan.interval_secs, 5);
        assert_eq!(config.scan.dispatch_interval_secs, 600);
        assert_eq!(config.dedup.backend, DedupBackend::Sqlite);
        assert_eq!(config.dedup.resolved_path(), PathBuf::from("/tmp/seen.db"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = DriveWatchConfig::default();
        assert_eq!(config.scan.interval_secs, 10_800);
        assert_eq!(config.chat.backend, ChatBackend::Discord);
        assert_eq!(config.dedup.backend, DedupBackend::Memory);
        assert!(config.drive.api_url.starts_with("https://"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = DriveWatchConfig::from_toml(SAMPLE).unwrap();
        config.apply_env_from(|key| match key {
            "BOT_TOKEN" => Some("env-token".into()),
            "CHANNEL_ID" => Some("99".into()),
            "GUILD_ID" => Some("  ".into()),
            _ => None,
        });
        assert_eq!(config.chat.bot_token, "env-token");
        assert_eq!(config.chat.channel_id, "99");
        // Blank values are ignored.
        assert_eq!(config.chat.guild_id, "1");
    }

    #[test]
    fn test_validate_missing_guild() {
        let mut config = DriveWatchConfig::from_toml(SAMPLE).unwrap();
        config.chat.guild_id.clear();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, DriveWatchError::Config(_)));
        assert!(err.to_string().contains("GUILD_ID"));
    }

    #[test]
    fn test_validate_duplicate_sources() {
        let mut config = DriveWatchConfig::from_toml(SAMPLE).unwrap();
        let dup = config.sources[0].clone();
        config.sources.push(dup);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_delay_too_long() {
        let mut config = DriveWatchConfig::from_toml(SAMPLE).unwrap();
        config.sources[1].delay_secs = Some(MAX_DELAY_SECS + 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_console_backend_needs_no_chat_credentials() {
        let mut config = DriveWatchConfig::from_toml(SAMPLE).unwrap();
        config.chat = ChatConfig { backend: ChatBackend::Console, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_masked_hides_secrets() {
        let config = DriveWatchConfig::from_toml(SAMPLE).unwrap();
        let masked = config.masked();
        assert_eq!(masked.chat.bot_token, MASK);
        assert_eq!(masked.drive.access_token, MASK);
        assert!(masked.chat.webhook_url.is_empty());
        let rendered = masked.to_toml().unwrap();
        assert!(!rendered.contains("ya29"));
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = DriveWatchConfig::load_from(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, DriveWatchError::ConfigNotFound(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let config = DriveWatchConfig::load_from(&path).unwrap();
        assert!(config.source("Sofia").is_some());
        assert!(config.source("Nobody").is_none());
    }
}

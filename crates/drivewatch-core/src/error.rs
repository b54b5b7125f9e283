//! Unified error types for DriveWatch.

use thiserror::Error;

/// Result type alias using DriveWatchError.
pub type Result<T> = std::result::Result<T, DriveWatchError>;

#[derive(Error, Debug)]
pub enum DriveWatchError {
    // Storage provider errors
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    // Channel errors
    #[error("Channel error: {0}")]
    Channel(String),

    /// The chat API refused the message outright; resending cannot help.
    #[error("Channel rejected message: {0}")]
    ChannelRejected(String),

    #[error("Channel not connected: {0}")]
    ChannelNotConnected(String),

    // Dedup store errors
    #[error("Store error: {0}")]
    Store(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

impl DriveWatchError {
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    pub fn channel(msg: impl Into<String>) -> Self {
        Self::Channel(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::ChannelRejected(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the failure is worth retrying on a later cycle.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Provider(_) | Self::Channel(_) | Self::Http(_) | Self::Timeout(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DriveWatchError::Provider("timeout".into());
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_error_constructors() {
        let e1 = DriveWatchError::provider("test");
        assert!(matches!(e1, DriveWatchError::Provider(_)));

        let e2 = DriveWatchError::channel("test");
        assert!(matches!(e2, DriveWatchError::Channel(_)));

        let e3 = DriveWatchError::store("test");
        assert!(matches!(e3, DriveWatchError::Store(_)));

        let e4 = DriveWatchError::config("test");
        assert!(matches!(e4, DriveWatchError::Config(_)));
    }

    #[test]
    fn test_transient_classification() {
        assert!(DriveWatchError::provider("503").is_transient());
        assert!(DriveWatchError::channel("rate limited").is_transient());
        assert!(!DriveWatchError::config("missing guild").is_transient());
        assert!(!DriveWatchError::store("disk full").is_transient());
        assert!(!DriveWatchError::rejected("403 Missing Permissions").is_transient());
        assert!(!DriveWatchError::ChannelNotConnected("discord".into()).is_transient());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DriveWatchError = io_err.into();
        assert!(matches!(err, DriveWatchError::Io(_)));
    }
}

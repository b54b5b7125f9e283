//! Watched source definitions.

use serde::{Deserialize, Serialize};

/// Longest accepted delivery delay (one year).
pub const MAX_DELAY_SECS: u64 = 365 * 24 * 60 * 60;

/// How a source root is enumerated.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Immediate subfolders of the root only.
    Shallow,
    /// Every file and folder in the subtree.
    #[default]
    Deep,
}

impl std::fmt::Display for ScanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanMode::Shallow => write!(f, "shallow"),
            ScanMode::Deep => write!(f, "deep"),
        }
    }
}

/// A watched root folder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceConfig {
    /// Display label, also the first breadcrumb segment.
    pub name: String,
    /// Provider id of the root folder.
    pub root_id: String,
    #[serde(default)]
    pub mode: ScanMode,
    /// Hold announcements for this many seconds before posting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_secs: Option<u64>,
}

impl SourceConfig {
    pub fn new(name: impl Into<String>, root_id: impl Into<String>, mode: ScanMode) -> Self {
        Self { name: name.into(), root_id: root_id.into(), mode, delay_secs: None }
    }

    pub fn with_delay_secs(mut self, secs: u64) -> Self {
        self.delay_secs = Some(secs);
        self
    }

    /// Delivery delay, if any. A zero delay counts as immediate; anything
    /// past `MAX_DELAY_SECS` is clamped to it.
    pub fn delay(&self) -> Option<chrono::Duration> {
        match self.delay_secs {
            Some(0) | None => None,
            Some(secs) => {
                let secs = i64::try_from(secs.min(MAX_DELAY_SECS)).unwrap_or_default();
                Some(chrono::Duration::seconds(secs))
            }
        }
    }
}

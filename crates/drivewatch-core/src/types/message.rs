//! Chat message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outgoing message to a channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Channel or thread identifier on the chat side.
    pub thread_id: String,
    pub content: String,
}

impl OutgoingMessage {
    pub fn new(thread_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self { thread_id: thread_id.into(), content: content.into() }
    }
}

/// A notification held back until `send_at`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingNotification {
    pub message: String,
    pub send_at: DateTime<Utc>,
    /// Delivery attempts that have already failed.
    #[serde(default)]
    pub attempts: u32,
}

impl PendingNotification {
    pub fn new(message: impl Into<String>, send_at: DateTime<Utc>) -> Self {
        Self { message: message.into(), send_at, attempts: 0 }
    }

    /// The same notification after one more failed attempt, due at `at`.
    pub fn retry(self, at: DateTime<Utc>) -> Self {
        Self { send_at: at, attempts: self.attempts.saturating_add(1), ..self }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.send_at <= now
    }
}

//! Pending-notification queue capability.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::PendingNotification;

/// Holds notifications until their `send_at` time.
///
/// `drain` removes what it returns in the same step, so a due entry is handed
/// out exactly once even with several consumers.
#[async_trait]
pub trait PendingQueue: Send + Sync {
    fn name(&self) -> &str;

    async fn enqueue(&self, pending: PendingNotification) -> Result<()>;

    /// Remove and return every entry with `send_at <= now`, earliest first.
    async fn drain(&self, now: DateTime<Utc>) -> Result<Vec<PendingNotification>>;

    /// Entries still queued.
    async fn count(&self) -> Result<usize>;

    /// Earliest `send_at` still queued.
    async fn next_due(&self) -> Result<Option<DateTime<Utc>>>;
}

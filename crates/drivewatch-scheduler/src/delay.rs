//! Delay queue — notifications held in memory until their `send_at` time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use drivewatch_core::error::Result;
use drivewatch_core::traits::PendingQueue;
use drivewatch_core::types::PendingNotification;
use std::sync::{Mutex, MutexGuard};

/// Shared between the scan task (producer) and the dispatch task (consumer).
/// Each operation holds the lock for its whole check-and-mutate, so a due
/// entry is handed out exactly once. Contents are lost on restart; durable
/// setups use the SQLite queue instead.
#[derive(Debug, Default)]
pub struct DelayQueue {
    entries: Mutex<Vec<PendingNotification>>,
}

impl DelayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<PendingNotification>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl PendingQueue for DelayQueue {
    fn name(&self) -> &str { "memory" }

    async fn enqueue(&self, pending: PendingNotification) -> Result<()> {
        self.entries().push(pending);
        Ok(())
    }

    /// Entries not yet due stay queued.
    async fn drain(&self, now: DateTime<Utc>) -> Result<Vec<PendingNotification>> {
        let mut entries = self.entries();
        let (mut due, pending): (Vec<_>, Vec<_>) =
            entries.drain(..).partition(|p| p.is_due(now));
        *entries = pending;
        due.sort_by_key(|p| p.send_at);
        Ok(due)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries().len())
    }

    async fn next_due(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.entries().iter().map(|p| p.send_at).min())
    }
}

//! Scan engine — periodic passes over every source plus the delay dispatcher.
//!
//! ```text
//! scan loop (interval)            dispatch loop (dispatch interval)
//!   └── per source: TreeWalker      └── PendingQueue::drain(now)
//!         └── SeenStore::record           └── Notifier::deliver
//!               ├── no delay → Notifier::deliver
//!               └── delay    → PendingQueue::enqueue(now + delay)
//! ```
//!
//! A delivery that fails transiently goes back on the queue due immediately,
//! so the next dispatch tick retries it, up to `MAX_DELIVERY_ATTEMPTS` in
//! total. Permanent refusals (bad permissions, deleted channel, oversized
//! message) are logged and dropped.

use chrono::{DateTime, Utc};
use drivewatch_core::error::DriveWatchError;
use drivewatch_core::traits::{Clock, PendingQueue, SeenStore, StorageProvider};
use drivewatch_core::types::{Node, PendingNotification, SeenRecord, SourceConfig};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::notify::Notifier;
use crate::walker::{TreeWalker, WalkEvent};

/// Delivery attempts per notification, the first immediate send included.
pub const MAX_DELIVERY_ATTEMPTS: u32 = 5;

/// Outcome of one pass (or one source within a pass).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub sources: usize,
    pub nodes: usize,
    pub new_items: usize,
    pub sent: usize,
    pub queued: usize,
    pub requeued: usize,
    pub dropped: usize,
    pub failures: usize,
}

impl PassReport {
    fn absorb(&mut self, other: PassReport) {
        self.sources += other.sources;
        self.nodes += other.nodes;
        self.new_items += other.new_items;
        self.sent += other.sent;
        self.queued += other.queued;
        self.requeued += other.requeued;
        self.dropped += other.dropped;
        self.failures += other.failures;
    }
}

/// Outcome of one dispatcher tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub requeued: usize,
    pub dropped: usize,
    pub still_pending: usize,
    pub next_due: Option<DateTime<Utc>>,
}

/// What became of a failed delivery.
enum Retry {
    Requeued,
    Dropped,
}

pub struct SchedulerEngine {
    provider: Arc<dyn StorageProvider>,
    store: Arc<dyn SeenStore>,
    queue: Arc<dyn PendingQueue>,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
    sources: Vec<SourceConfig>,
    shutdown: Option<watch::Receiver<bool>>,
}

impl SchedulerEngine {
    pub fn new(
        provider: Arc<dyn StorageProvider>,
        store: Arc<dyn SeenStore>,
        queue: Arc<dyn PendingQueue>,
        notifier: Notifier,
        clock: Arc<dyn Clock>,
        sources: Vec<SourceConfig>,
    ) -> Self {
        Self { provider, store, queue, notifier, clock, sources, shutdown: None }
    }

    /// Stop walks early once `shutdown` flips to `true`.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn sources(&self) -> &[SourceConfig] {
        &self.sources
    }

    fn is_shutting_down(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Scan every source once, in configuration order.
    pub async fn run_pass(&self) -> PassReport {
        let mut report = PassReport::default();
        for source in &self.sources {
            if self.is_shutting_down() {
                break;
            }
            report.absorb(self.scan_source(source).await);
        }
        report
    }

    /// Walk one source and announce (or queue) everything not seen before.
    /// Listing failures are counted and logged; they never abort the walk.
    pub async fn scan_source(&self, source: &SourceConfig) -> PassReport {
        let mut report = PassReport { sources: 1, ..Default::default() };
        tracing::debug!("Scanning {} ({}, {})", source.name, source.root_id, source.mode);

        let walker = TreeWalker::new(self.provider.as_ref(), &source.root_id, &source.name, source.mode);
        let mut events = std::pin::pin!(walker.into_stream());
        while let Some(event) = events.next().await {
            match event {
                WalkEvent::Node(node) => {
                    report.nodes += 1;
                    self.handle_node(source, &node, &mut report).await;
                }
                WalkEvent::Listed { folder_id } => {
                    if let Err(e) = self.store.mark_folder_scanned(&folder_id, &source.name).await {
                        tracing::warn!("Could not mark {folder_id} scanned: {e}");
                    }
                }
                WalkEvent::Failed { .. } => report.failures += 1,
            }
            if self.is_shutting_down() {
                tracing::info!("Shutdown requested, abandoning walk of {}", source.name);
                break;
            }
        }
        report
    }

    async fn handle_node(&self, source: &SourceConfig, node: &Node, report: &mut PassReport) {
        match self.store.is_new(&node.id).await {
            Ok(false) => return,
            Ok(true) => {}
            Err(e) => {
                tracing::error!("Dedup lookup for {} failed: {e}", node.full_path());
                report.failures += 1;
                return;
            }
        }

        // `record` is the authoritative claim; losing the race means another
        // writer already announced this id.
        match self.store.record(&SeenRecord::from(node)).await {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => {
                tracing::error!("Recording {} failed: {e}", node.full_path());
                report.failures += 1;
                return;
            }
        }
        report.new_items += 1;

        let text = self.notifier.format(node);
        let now = self.clock.now();
        if let Some(delay) = source.delay() {
            let send_at = now + delay;
            match self.queue.enqueue(PendingNotification::new(text, send_at)).await {
                Ok(()) => {
                    tracing::debug!("Queued {} until {send_at}", node.full_path());
                    report.queued += 1;
                }
                Err(e) => {
                    tracing::error!("Could not queue {}: {e}", node.full_path());
                    report.failures += 1;
                }
            }
            return;
        }

        match self.notifier.deliver(&text).await {
            Ok(()) => {
                tracing::info!("Announced {} {}", node.kind, node.full_path());
                report.sent += 1;
            }
            Err(e) => match self.retry_later(PendingNotification::new(text, now), &e, now).await {
                Retry::Requeued => report.requeued += 1,
                Retry::Dropped => report.dropped += 1,
            },
        }
    }

    /// Put a failed delivery back on the queue, due `now`, unless the failure
    /// is permanent or the notification has used up its attempts.
    async fn retry_later(&self, pending: PendingNotification, error: &DriveWatchError, now: DateTime<Utc>) -> Retry {
        let pending = pending.retry(now);
        if !error.is_transient() {
            tracing::error!("Dropping notification, delivery refused: {error} ({})", pending.message);
            return Retry::Dropped;
        }
        if pending.attempts >= MAX_DELIVERY_ATTEMPTS {
            tracing::error!(
                "Dropping notification after {} attempts: {error} ({})",
                pending.attempts,
                pending.message
            );
            return Retry::Dropped;
        }

        tracing::warn!("Delivery failed (attempt {}), will retry: {error}", pending.attempts);
        match self.queue.enqueue(pending).await {
            Ok(()) => Retry::Requeued,
            Err(e) => {
                tracing::error!("Could not requeue notification: {e}");
                Retry::Dropped
            }
        }
    }

    /// Deliver every due queued notification.
    pub async fn dispatch_due(&self) -> DispatchReport {
        let now = self.clock.now();
        let mut report = DispatchReport::default();

        let due = match self.queue.drain(now).await {
            Ok(due) => due,
            Err(e) => {
                tracing::error!("Reading the {} queue failed: {e}", self.queue.name());
                return report;
            }
        };

        for pending in due {
            match self.notifier.deliver(&pending.message).await {
                Ok(()) => report.delivered += 1,
                Err(e) => match self.retry_later(pending, &e, now).await {
                    Retry::Requeued => report.requeued += 1,
                    Retry::Dropped => report.dropped += 1,
                },
            }
        }

        match self.queue.count().await {
            Ok(n) => report.still_pending = n,
            Err(e) => tracing::warn!("Could not count queued notifications: {e}"),
        }
        match self.queue.next_due().await {
            Ok(at) => report.next_due = at,
            Err(e) => tracing::warn!("Could not read next due time: {e}"),
        }
        report
    }

    /// Full pass, sleep, repeat — until `shutdown` flips or its sender drops.
    pub async fn run_scan_loop(self: Arc<Self>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            "Scan loop started: {} sources every {}s via {}",
            self.sources.len(),
            interval.as_secs(),
            self.notifier.channel_name()
        );
        loop {
            if *shutdown.borrow() {
                break;
            }
            tracing::info!("{} - Starting scan cycle", self.clock.now().to_rfc3339());
            let report = self.run_pass().await;
            tracing::info!(
                sources = report.sources,
                nodes = report.nodes,
                new_items = report.new_items,
                sent = report.sent,
                queued = report.queued,
                dropped = report.dropped,
                failures = report.failures,
                "Scan complete, sleeping for {}s",
                interval.as_secs()
            );

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => break,
            }
        }
        tracing::info!("Scan loop stopped");
    }

    /// Drain due notifications every `interval` until shutdown.
    pub async fn run_dispatch_loop(self: Arc<Self>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            "Dispatcher started: checking the {} queue every {}s",
            self.queue.name(),
            interval.as_secs()
        );
        let mut last = DispatchReport::default();
        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => break,
            }
            if *shutdown.borrow() {
                break;
            }
            last = self.dispatch_due().await;
            if last.delivered > 0 || last.requeued > 0 || last.dropped > 0 {
                tracing::info!(
                    delivered = last.delivered,
                    requeued = last.requeued,
                    dropped = last.dropped,
                    pending = last.still_pending,
                    "Dispatched delayed notifications"
                );
            }
        }

        let left = self.queue.count().await.unwrap_or(last.still_pending);
        match self.queue.next_due().await.ok().flatten() {
            Some(next) if left > 0 => tracing::warn!(
                "Dispatcher stopped with {left} notifications queued in the {} queue, next due {next}",
                self.queue.name()
            ),
            _ => tracing::info!("Dispatcher stopped"),
        }
    }

    /// Spawn the scan loop and the dispatcher as two tasks.
    pub fn spawn(
        self: Arc<Self>,
        scan_interval: Duration,
        dispatch_interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> (JoinHandle<()>, JoinHandle<()>) {
        let scan = tokio::spawn(self.clone().run_scan_loop(scan_interval, shutdown.clone()));
        let dispatch = tokio::spawn(self.run_dispatch_loop(dispatch_interval, shutdown));
        (scan, dispatch)
    }
}

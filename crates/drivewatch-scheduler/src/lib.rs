//! # DriveWatch Scheduler
//!
//! Change detection and notification scheduling.
//!
//! ## Architecture
//! ```text
//! SchedulerEngine
//!   ├── scan loop (every scan interval)
//!   │     └── TreeWalker per source ── SeenStore (dedup)
//!   │           ├── immediate → Notifier → Channel
//!   │           └── delayed   → PendingQueue
//!   └── dispatch loop (every dispatch interval)
//!         └── PendingQueue::drain(now) → Notifier → Channel
//! ```
//!
//! `DelayQueue` is the in-memory `PendingQueue`; the SQLite store in
//! `drivewatch-memory` provides the durable one.

pub mod delay;
pub mod engine;
pub mod notify;
pub mod walker;

#[cfg(test)]
mod testing;

pub use delay::DelayQueue;
pub use engine::{DispatchReport, MAX_DELIVERY_ATTEMPTS, PassReport, SchedulerEngine};
pub use notify::{Notifier, format_announcement};
pub use walker::{TreeWalker, WalkEvent};

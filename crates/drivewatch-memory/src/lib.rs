//! # DriveWatch Memory
//! Seen-item stores: an ephemeral in-process set and a durable SQLite table.
//! The SQLite store also keeps queued notifications across restarts.

pub mod ephemeral;
pub mod sqlite;

use drivewatch_core::config::{DedupBackend, DedupConfig};
use drivewatch_core::error::Result;
use drivewatch_core::traits::{PendingQueue, SeenStore};
use std::sync::Arc;

pub use ephemeral::EphemeralStore;
pub use sqlite::SqliteStore;

/// Stores built from configuration.
pub struct Stores {
    pub seen: Arc<dyn SeenStore>,
    /// Durable pending queue, when the backend has one. Callers fall back to
    /// an in-memory queue otherwise.
    pub pending: Option<Arc<dyn PendingQueue>>,
}

/// Create the dedup store (and, for SQLite, the pending queue) from configuration.
pub fn create_store(config: &DedupConfig) -> Result<Stores> {
    match config.backend {
        DedupBackend::Memory => {
            tracing::warn!("Using in-memory dedup store; items will be re-announced after restart");
            Ok(Stores { seen: Arc::new(EphemeralStore::new()), pending: None })
        }
        DedupBackend::Sqlite => {
            let store = Arc::new(SqliteStore::open(&config.resolved_path())?);
            Ok(Stores { seen: store.clone(), pending: Some(store) })
        }
    }
}

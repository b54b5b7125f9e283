//! Dedup store capability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::SeenRecord;

/// Row counts reported by a store.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreStats {
    pub seen_items: usize,
    pub scanned_folders: usize,
}

/// Tracks which item ids have already been announced.
///
/// `record` is the authoritative check: it inserts only when the id is absent
/// and reports whether it did, in one step. Callers announce an item only when
/// `record` returns `true`, so two scanners racing on the same id can never
/// both win.
#[async_trait]
pub trait SeenStore: Send + Sync {
    fn name(&self) -> &str;

    async fn is_new(&self, id: &str) -> Result<bool>;

    /// Insert-if-absent. Returns `true` if the id was not present before.
    async fn record(&self, record: &SeenRecord) -> Result<bool>;

    /// Note that a folder's listing was walked during a pass.
    async fn mark_folder_scanned(&self, folder_id: &str, source: &str) -> Result<()>;

    async fn stats(&self) -> Result<StoreStats>;
}

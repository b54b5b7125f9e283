//! In-memory dedup store. Lost on restart.

use async_trait::async_trait;
use drivewatch_core::error::Result;
use drivewatch_core::traits::{SeenStore, StoreStats};
use drivewatch_core::types::SeenRecord;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct State {
    seen: HashMap<String, SeenRecord>,
    scanned_folders: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct EphemeralStore {
    state: Mutex<State>,
}

impl EphemeralStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &str) -> Option<SeenRecord> {
        self.state.lock().await.seen.get(id).cloned()
    }
}

#[async_trait]
impl SeenStore for EphemeralStore {
    fn name(&self) -> &str { "memory" }

    async fn is_new(&self, id: &str) -> Result<bool> {
        Ok(!self.state.lock().await.seen.contains_key(id))
    }

    async fn record(&self, record: &SeenRecord) -> Result<bool> {
        let mut state = self.state.lock().await;
        if state.seen.contains_key(&record.id) {
            return Ok(false);
        }
        state.seen.insert(record.id.clone(), record.clone());
        Ok(true)
    }

    async fn mark_folder_scanned(&self, folder_id: &str, _source: &str) -> Result<()> {
        self.state.lock().await.scanned_folders.insert(folder_id.to_string());
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let state = self.state.lock().await;
        Ok(StoreStats {
            seen_items: state.seen.len(),
            scanned_folders: state.scanned_folders.len(),
        })
    }
}

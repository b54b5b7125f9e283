//! In-memory provider and channel doubles for scheduler tests.

use async_trait::async_trait;
use drivewatch_core::error::{DriveWatchError, Result};
use drivewatch_core::traits::{Channel, ListFilter, StorageProvider};
use drivewatch_core::types::{DriveItem, OutgoingMessage};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
pub struct FakeDrive {
    children: HashMap<String, Vec<DriveItem>>,
    failing: HashSet<String>,
    calls: Mutex<Vec<(String, ListFilter)>>,
}

impl FakeDrive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn folder(mut self, id: &str, children: Vec<DriveItem>) -> Self {
        self.children.insert(id.to_string(), children);
        self
    }

    pub fn failing(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, ListFilter)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageProvider for FakeDrive {
    fn name(&self) -> &str { "fake" }

    async fn list_children(&self, parent_id: &str, filter: ListFilter) -> Result<Vec<DriveItem>> {
        self.calls.lock().unwrap().push((parent_id.to_string(), filter));
        if self.failing.contains(parent_id) {
            return Err(DriveWatchError::provider(format!("503 listing {parent_id}")));
        }
        let children = self.children.get(parent_id)
            .ok_or_else(|| DriveWatchError::FolderNotFound(parent_id.to_string()))?;
        Ok(children.iter()
            .filter(|c| filter == ListFilter::All || c.is_folder())
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<OutgoingMessage>>,
    failing: AtomicBool,
    rejecting: AtomicBool,
    disconnected: AtomicBool,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Answer every send the way Discord answers a 403.
    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }

    pub fn set_disconnected(&self, disconnected: bool) {
        self.disconnected.store(disconnected, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|m| m.content.clone()).collect()
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    fn name(&self) -> &str { "recording" }

    async fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        !self.disconnected.load(Ordering::SeqCst)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<()> {
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(DriveWatchError::rejected("Discord 403 Forbidden: Missing Permissions"));
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(DriveWatchError::channel("Discord 503"));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

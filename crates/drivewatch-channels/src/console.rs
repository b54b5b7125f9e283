//! Console channel — logs notifications instead of posting them (dry runs).

use async_trait::async_trait;
use drivewatch_core::error::Result;
use drivewatch_core::traits::Channel;
use drivewatch_core::types::OutgoingMessage;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct ConsoleChannel {
    sent: AtomicUsize,
}

impl ConsoleChannel {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Channel for ConsoleChannel {
    fn name(&self) -> &str { "console" }

    async fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_connected(&self) -> bool { true }

    async fn send(&self, message: OutgoingMessage) -> Result<()> {
        let n = self.sent.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(target: "drivewatch::notify", "[dry-run #{n}] {}", message.content);
        Ok(())
    }
}

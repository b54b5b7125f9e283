//! Chat channel capability.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::OutgoingMessage;

/// A chat destination notifications are posted to.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Establish the session and verify the target exists.
    async fn connect(&mut self) -> Result<()>;

    fn is_connected(&self) -> bool;

    async fn send(&self, message: OutgoingMessage) -> Result<()>;
}

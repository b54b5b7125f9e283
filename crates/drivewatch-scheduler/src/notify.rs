//! Notification formatting and delivery.

use drivewatch_core::error::{DriveWatchError, Result};
use drivewatch_core::traits::Channel;
use drivewatch_core::types::{Node, NodeKind, OutgoingMessage};
use std::sync::Arc;

/// Announcement text for a newly discovered node.
///
/// `<@&ROLE> 📄 New file detected: A>B>y.txt`
pub fn format_announcement(node: &Node, mention_role_id: Option<&str>) -> String {
    let label = match node.kind {
        NodeKind::File => "New file detected",
        NodeKind::Folder => "New folder detected",
    };
    let body = format!("{} {label}: {}", node.kind.emoji(), node.full_path());
    match mention_role_id {
        Some(role) if !role.is_empty() => format!("<@&{role}> {body}"),
        _ => body,
    }
}

/// Formats announcements and posts them to one chat target.
pub struct Notifier {
    channel: Arc<dyn Channel>,
    thread_id: String,
    mention_role_id: Option<String>,
}

impl Notifier {
    pub fn new(channel: Arc<dyn Channel>, thread_id: impl Into<String>, mention_role_id: Option<String>) -> Self {
        Self { channel, thread_id: thread_id.into(), mention_role_id }
    }

    pub fn format(&self, node: &Node) -> String {
        format_announcement(node, self.mention_role_id.as_deref())
    }

    pub async fn deliver(&self, text: &str) -> Result<()> {
        if !self.channel.is_connected() {
            return Err(DriveWatchError::ChannelNotConnected(self.channel.name().to_string()));
        }
        self.channel
            .send(OutgoingMessage::new(self.thread_id.clone(), text))
            .await
    }

    pub fn channel_name(&self) -> &str {
        self.channel.name()
    }
}

//! Shared domain types.

pub mod message;
pub mod node;
pub mod source;

pub use message::{OutgoingMessage, PendingNotification};
pub use node::{DriveItem, Node, NodeKind, SeenRecord, PATH_SEPARATOR, join_path};
pub use source::{ScanMode, SourceConfig};

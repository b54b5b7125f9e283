//! Capability traits the scanning core calls into.

pub mod channel;
pub mod clock;
pub mod pending;
pub mod seen;
pub mod storage;

pub use channel::Channel;
pub use clock::{Clock, ManualClock, SystemClock};
pub use pending::PendingQueue;
pub use seen::{SeenStore, StoreStats};
pub use storage::{ListFilter, StorageProvider};

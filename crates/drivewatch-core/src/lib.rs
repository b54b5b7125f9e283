//! # DriveWatch Core
//! Domain types, capability traits, clock and configuration shared by every
//! DriveWatch crate.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::DriveWatchConfig;
pub use error::{DriveWatchError, Result};

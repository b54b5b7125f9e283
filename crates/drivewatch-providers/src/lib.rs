//! # DriveWatch Providers
//! Storage provider implementations behind the `StorageProvider` capability.

pub mod gdrive;

use drivewatch_core::DriveWatchConfig;
use drivewatch_core::error::Result;
use drivewatch_core::traits::StorageProvider;

pub use gdrive::GoogleDriveProvider;

/// Create the storage provider described by the configuration.
pub fn create_provider(config: &DriveWatchConfig) -> Result<Box<dyn StorageProvider>> {
    let provider = GoogleDriveProvider::new(&config.drive, config.scan.request_timeout())?;
    Ok(Box::new(provider))
}

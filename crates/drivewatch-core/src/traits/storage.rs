//! Storage provider capability.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::DriveItem;

/// Which children a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFilter {
    FoldersOnly,
    All,
}

/// Lists the direct children of a folder by id.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Children are returned in provider order; callers must not assume sorting.
    async fn list_children(&self, parent_id: &str, filter: ListFilter) -> Result<Vec<DriveItem>>;
}

//! Tree walker — lazy depth-first enumeration of a source's folder tree.
//!
//! The walk keeps an explicit stack instead of recursing, so depth is bounded
//! only by memory and the caller may stop between any two events. A folder is
//! listed only when the walk reaches it.
//!
//! ```text
//! A
//! ├── x.txt (1)          Deep:    File 1 "A>x.txt"
//! └── B (2)                       Folder 2 "A>B"
//!     └── y.txt (3)               File 3 "A>B>y.txt"
//! ```

use drivewatch_core::error::DriveWatchError;
use drivewatch_core::traits::{ListFilter, StorageProvider};
use drivewatch_core::types::{DriveItem, Node, ScanMode, join_path};
use futures::stream::Stream;

/// One step of a walk.
#[derive(Debug)]
pub enum WalkEvent {
    /// A discovered file or folder.
    Node(Node),
    /// A folder's children were listed successfully.
    Listed { folder_id: String },
    /// Listing a folder failed; nothing below it is visited this walk.
    Failed { folder_id: String, path: String, error: DriveWatchError },
}

enum Work {
    Expand { folder_id: String, path: String },
    Emit(Node),
}

pub struct TreeWalker<'a> {
    provider: &'a dyn StorageProvider,
    mode: ScanMode,
    stack: Vec<Work>,
}

impl<'a> TreeWalker<'a> {
    /// Start a walk at `root_id`; `source_name` is the first breadcrumb segment.
    pub fn new(provider: &'a dyn StorageProvider, root_id: &str, source_name: &str, mode: ScanMode) -> Self {
        Self {
            provider,
            mode,
            stack: vec![Work::Expand {
                folder_id: root_id.to_string(),
                path: source_name.to_string(),
            }],
        }
    }

    /// Advance the walk. Returns `None` once the tree is exhausted.
    pub async fn next(&mut self) -> Option<WalkEvent> {
        let work = self.stack.pop()?;
        match work {
            Work::Emit(node) => Some(WalkEvent::Node(node)),
            Work::Expand { folder_id, path } => Some(self.expand(folder_id, path).await),
        }
    }

    async fn expand(&mut self, folder_id: String, path: String) -> WalkEvent {
        let filter = match self.mode {
            ScanMode::Shallow => ListFilter::FoldersOnly,
            ScanMode::Deep => ListFilter::All,
        };

        let children = match self.provider.list_children(&folder_id, filter).await {
            Ok(children) => children,
            Err(error) => {
                tracing::error!("Listing {path} ({folder_id}) failed: {error}");
                return WalkEvent::Failed { folder_id, path, error };
            }
        };

        let (folders, files): (Vec<DriveItem>, Vec<DriveItem>) =
            children.into_iter().partition(DriveItem::is_folder);

        // Pushed in reverse so pops come out as: files in provider order, then
        // each subfolder immediately followed by its own subtree.
        for folder in folders.into_iter().rev() {
            let node = Node::from_item(folder, path.clone());
            if self.mode == ScanMode::Deep {
                self.stack.push(Work::Expand {
                    folder_id: node.id.clone(),
                    path: join_path(&path, &node.name),
                });
            }
            self.stack.push(Work::Emit(node));
        }
        if self.mode == ScanMode::Deep {
            for file in files.into_iter().rev() {
                self.stack.push(Work::Emit(Node::from_item(file, path.clone())));
            }
        }

        WalkEvent::Listed { folder_id }
    }

    /// The walk as a stream of events; listings still happen on demand.
    pub fn into_stream(self) -> impl Stream<Item = WalkEvent> + 'a {
        futures::stream::unfold(self, |mut walker| async move {
            walker.next().await.map(|event| (event, walker))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDrive;
    use drivewatch_core::types::NodeKind;
    use futures::StreamExt;

    async fn walk_nodes(walker: TreeWalker<'_>) -> Vec<Node> {
        walker.into_stream()
            .filter_map(|event| async move {
                match event {
                    WalkEvent::Node(node) => Some(node),
                    _ => None,
                }
            })
            .collect()
            .await
    }

    fn ids(nodes: &[Node]) -> Vec<(&str, NodeKind, String)> {
        nodes.iter().map(|n| (n.id.as_str(), n.kind, n.full_path())).collect()
    }

    #[tokio::test]
    async fn test_deep_walk_order() {
        let drive = FakeDrive::new()
            .folder("A", vec![DriveItem::file("1", "x.txt", Some(10)), DriveItem::folder("2", "B")])
            .folder("2", vec![DriveItem::file("3", "y.txt", None)]);

        let nodes = walk_nodes(TreeWalker::new(&drive, "A", "A", ScanMode::Deep)).await;
        assert_eq!(ids(&nodes), vec![
            ("1", NodeKind::File, "A>x.txt".to_string()),
            ("2", NodeKind::Folder, "A>B".to_string()),
            ("3", NodeKind::File, "A>B>y.txt".to_string()),
        ]);
    }

    #[tokio::test]
    async fn test_deep_walk_files_first_and_subtree_before_sibling() {
        // Provider returns the folder before the file, and C before B.
        let drive = FakeDrive::new()
            .folder("root", vec![
                DriveItem::folder("c", "C"),
                DriveItem::file("f", "top.txt", None),
                DriveItem::folder("b", "B"),
            ])
            .folder("c", vec![DriveItem::file("c1", "in-c.txt", None)])
            .folder("b", vec![DriveItem::file("b1", "in-b.txt", None)]);

        let nodes = walk_nodes(TreeWalker::new(&drive, "root", "R", ScanMode::Deep)).await;
        let paths: Vec<String> = nodes.iter().map(Node::full_path).collect();
        assert_eq!(paths, vec!["R>top.txt", "R>C", "R>C>in-c.txt", "R>B", "R>B>in-b.txt"]);
    }

    #[tokio::test]
    async fn test_shallow_walk_folders_only() {
        let drive = FakeDrive::new()
            .folder("A", vec![
                DriveItem::file("1", "x.txt", None),
                DriveItem::folder("2", "B"),
                DriveItem::folder("4", "C"),
            ])
            .folder("2", vec![DriveItem::file("3", "y.txt", None)]);

        let nodes = walk_nodes(TreeWalker::new(&drive, "A", "A", ScanMode::Shallow)).await;
        assert_eq!(ids(&nodes), vec![
            ("2", NodeKind::Folder, "A>B".to_string()),
            ("4", NodeKind::Folder, "A>C".to_string()),
        ]);
        assert_eq!(drive.calls(), vec![("A".to_string(), ListFilter::FoldersOnly)]);
    }

    #[tokio::test]
    async fn test_empty_folder_does_not_stop_walk() {
        let drive = FakeDrive::new()
            .folder("A", vec![DriveItem::folder("e", "Empty"), DriveItem::folder("f", "Full")])
            .folder("e", vec![])
            .folder("f", vec![DriveItem::file("z", "z.bin", None)]);

        let nodes = walk_nodes(TreeWalker::new(&drive, "A", "A", ScanMode::Deep)).await;
        let paths: Vec<String> = nodes.iter().map(Node::full_path).collect();
        assert_eq!(paths, vec!["A>Empty", "A>Full", "A>Full>z.bin"]);
    }

    #[tokio::test]
    async fn test_failed_branch_skipped_siblings_continue() {
        let drive = FakeDrive::new()
            .folder("A", vec![DriveItem::folder("bad", "Broken"), DriveItem::folder("ok", "Fine")])
            .failing("bad")
            .folder("ok", vec![DriveItem::file("1", "a.txt", None)]);

        let mut walker = TreeWalker::new(&drive, "A", "A", ScanMode::Deep);
        let mut failed = Vec::new();
        let mut paths = Vec::new();
        while let Some(event) = walker.next().await {
            match event {
                WalkEvent::Node(n) => paths.push(n.full_path()),
                WalkEvent::Failed { folder_id, path, .. } => failed.push((folder_id, path)),
                WalkEvent::Listed { .. } => {}
            }
        }
        assert_eq!(failed, vec![("bad".to_string(), "A>Broken".to_string())]);
        assert_eq!(paths, vec!["A>Broken", "A>Fine", "A>Fine>a.txt"]);
    }

    #[tokio::test]
    async fn test_walk_is_lazy() {
        let drive = FakeDrive::new()
            .folder("A", vec![DriveItem::folder("2", "B")])
            .folder("2", vec![]);

        let mut walker = TreeWalker::new(&drive, "A", "A", ScanMode::Deep);
        assert!(drive.calls().is_empty());
        assert!(matches!(walker.next().await, Some(WalkEvent::Listed { .. })));
        assert_eq!(drive.calls().len(), 1);
        assert!(matches!(walker.next().await, Some(WalkEvent::Node(_))));
        assert_eq!(drive.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_stream_adapter() {
        let drive = FakeDrive::new().folder("A", vec![DriveItem::file("1", "x.txt", None)]);
        let events: Vec<WalkEvent> = TreeWalker::new(&drive, "A", "A", ScanMode::Deep)
            .into_stream()
            .collect()
            .await;
        assert_eq!(events.len(), 2);
    }
}

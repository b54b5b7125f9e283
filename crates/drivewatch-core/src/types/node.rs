//! Storage tree nodes and the records kept for them once announced.

use serde::{Deserialize, Serialize};

/// Separator used when joining node names into a breadcrumb.
pub const PATH_SEPARATOR: char = '>';

/// Join a breadcrumb and a child name: `A>B` + `c.txt` → `A>B>c.txt`.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        return name.to_string();
    }
    format!("{parent}{PATH_SEPARATOR}{name}")
}

/// Kind of a storage node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Folder,
}

impl NodeKind {
    /// Marker used in chat announcements.
    pub fn emoji(&self) -> &'static str {
        match self {
            NodeKind::File => "📄",
            NodeKind::Folder => "📁",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::File => write!(f, "file"),
            NodeKind::Folder => write!(f, "folder"),
        }
    }
}

/// A child entry as returned by a storage provider listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DriveItem {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl DriveItem {
    pub fn file(id: impl Into<String>, name: impl Into<String>, size: Option<u64>) -> Self {
        Self { id: id.into(), name: name.into(), kind: NodeKind::File, size }
    }

    pub fn folder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), kind: NodeKind::Folder, size: None }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }
}

/// A discovered node, annotated with the breadcrumb of its parent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub size: Option<u64>,
    pub parent_path: String,
}

impl Node {
    pub fn from_item(item: DriveItem, parent_path: impl Into<String>) -> Self {
        // Folders never carry a size, whatever the provider reports.
        let size = match item.kind {
            NodeKind::File => item.size,
            NodeKind::Folder => None,
        };
        Self {
            id: item.id,
            name: item.name,
            kind: item.kind,
            size,
            parent_path: parent_path.into(),
        }
    }

    /// Breadcrumb from the source root down to this node.
    pub fn full_path(&self) -> String {
        join_path(&self.parent_path, &self.name)
    }
}

/// A previously announced node, as held by a dedup store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeenRecord {
    pub id: String,
    pub name: String,
    pub size: Option<u64>,
    pub full_path: String,
}

impl From<&Node> for SeenRecord {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            size: node.size,
            full_path: node.full_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("A", "x.txt"), "A>x.txt");
        assert_eq!(join_path("A>B", "y.txt"), "A>B>y.txt");
        assert_eq!(join_path("", "root"), "root");
    }

    #[test]
    fn test_folder_drops_size() {
        let item = DriveItem { id: "2".into(), name: "B".into(), kind: NodeKind::Folder, size: Some(10) };
        let node = Node::from_item(item, "A");
        assert_eq!(node.size, None);
        assert_eq!(node.full_path(), "A>B");
    }

    #[test]
    fn test_seen_record_from_node() {
        let node = Node::from_item(DriveItem::file("3", "y.txt", Some(42)), "A>B");
        let rec = SeenRecord::from(&node);
        assert_eq!(rec.id, "3");
        assert_eq!(rec.size, Some(42));
        assert_eq!(rec.full_path, "A>B>y.txt");
    }

    #[test]
    fn test_kind_markers() {
        assert_eq!(NodeKind::File.emoji(), "📄");
        assert_eq!(NodeKind::Folder.emoji(), "📁");
        assert_eq!(NodeKind::Folder.to_string(), "folder");
    }
}

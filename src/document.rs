//! # Documents
//!
//! The read-only view of a stored tree node that every check works with.
//! Identifiers follow the `<depth>:<path>` layout used by the document store
//! (`0:/`, `1:/content`, `2:/content/site`). Long paths are stored under a
//! hashed id (`<depth>:h<hash>`) and carry their real path in the document;
//! previous (split) revisions live under `<depth>:p/...`.

use std::fmt;

use serde::Serialize;

/// Stable identifier of a stored document.
///
/// Ordered lexicographically, which is the order stores paginate by. Checks
/// must not assume parents are visited before their children.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id of the document holding the node at `path`.
    pub fn from_path(path: &str) -> Self {
        Self(format!("{}:{}", path_depth(path), path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Id of the parent node, when it can be derived from the id alone.
    ///
    /// Returns `None` for the root, for hashed long-path ids and for ids that
    /// do not follow the `<depth>:<path>` layout.
    pub fn derived_parent(&self) -> Option<DocumentId> {
        let path = self.path()?;
        parent_path(path).map(DocumentId::from_path)
    }

    /// The node path encoded in the id, if it is a plain path id.
    pub fn path(&self) -> Option<&str> {
        let (depth, path) = self.0.split_once(':')?;
        depth.parse::<usize>().ok()?;
        if path.starts_with('/') {
            Some(path)
        } else {
            None
        }
    }

    pub fn is_split(&self) -> bool {
        self.0
            .split_once(':')
            .is_some_and(|(_, rest)| rest.starts_with("p/"))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DocumentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Structural classification used by the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// A live tree node.
    Node,
    /// A tombstone: the node was deleted as of the reference point.
    Deleted,
    /// A previous-revisions document split off a node; not a tree node.
    Split,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Node => "node",
            DocumentKind::Deleted => "deleted",
            DocumentKind::Split => "split",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored document as delivered by a store scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    id: DocumentId,
    parent: Option<DocumentId>,
    kind: DocumentKind,
    has_children: bool,
}

impl Document {
    /// A live node whose parent is derived from its id.
    pub fn node(id: impl Into<DocumentId>) -> Self {
        let id = id.into();
        let parent = id.derived_parent();
        Self {
            id,
            parent,
            kind: DocumentKind::Node,
            has_children: true,
        }
    }

    /// A live node with an explicit parent reference.
    pub fn with_parent(id: impl Into<DocumentId>, parent: Option<DocumentId>) -> Self {
        Self {
            id: id.into(),
            parent,
            kind: DocumentKind::Node,
            has_children: true,
        }
    }

    pub fn kind_of(mut self, kind: DocumentKind) -> Self {
        self.kind = kind;
        self
    }

    /// Marks whether the node may have children. Leaves are not retained by
    /// the orphan check once resolved.
    pub fn children(mut self, has_children: bool) -> Self {
        self.has_children = has_children;
        self
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn parent_id(&self) -> Option<&DocumentId> {
        self.parent.as_ref()
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn has_children(&self) -> bool {
        self.has_children
    }
}

fn path_depth(path: &str) -> usize {
    path.split('/').filter(|segment| !segment.is_empty()).count()
}

fn parent_path(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    match trimmed.rfind('/') {
        Some(0) => Some("/"),
        Some(idx) => Some(&trimmed[..idx]),
        None => None,
    }
}

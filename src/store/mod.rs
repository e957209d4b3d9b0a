//! # Document Stores
//!
//! The read side of the document store as the checker sees it: a one-shot
//! forward scan over all documents as of a reference point, and a cheap,
//! approximate document count used for ETA projection only.

pub mod jsonl;
pub mod memory;
pub mod sqlite;

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::constants::DEFAULT_ROOT_ID;
use crate::document::{Document, DocumentId, DocumentKind};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// The fixed point a scan is evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencePoint {
    /// Id of the tree root; documents whose parent is this id are reachable.
    pub root: DocumentId,
}

impl ReferencePoint {
    pub fn new(root: impl Into<DocumentId>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for ReferencePoint {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_ID)
    }
}

/// Lazy, finite, one-shot sequence of documents.
pub type DocumentScan<'a> = Box<dyn Iterator<Item = Result<Document, StoreError>> + 'a>;

pub trait DocumentStore: Send + Sync {
    /// Start a forward scan over every document. Errors yielded by the
    /// sequence are fatal to the run.
    fn scan(&self, reference: &ReferencePoint) -> Result<DocumentScan<'_>, StoreError>;

    /// Approximate number of documents, if the backend can tell cheaply.
    fn estimated_count(&self, reference: &ReferencePoint) -> Option<u64>;

    /// Short backend name for logs.
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Jsonl,
    Sqlite,
}

pub fn open_store(
    kind: StoreKind,
    path: &Path,
    batch_size: usize,
) -> Result<Box<dyn DocumentStore>, StoreError> {
    match kind {
        StoreKind::Jsonl => Ok(Box::new(jsonl::JsonlStore::open(path)?)),
        StoreKind::Sqlite => Ok(Box::new(sqlite::SqliteStore::open(path, batch_size)?)),
    }
}

/// Persisted layout of a document, as written by the store.
///
/// Everything but `_id` is decoded loosely: a field of the wrong type is a
/// problem with that one document, not with the store.
#[derive(Debug, Deserialize)]
struct StoredDocument {
    #[serde(rename = "_id")]
    id: Option<String>,
    #[serde(rename = "_path")]
    path: Option<Value>,
    #[serde(rename = "_parent")]
    parent: Option<Value>,
    #[serde(rename = "_deleted")]
    deleted: Option<Value>,
    #[serde(rename = "_children")]
    children: Option<Value>,
}

/// Decode one persisted document. `id` overrides the `_id` field when the
/// backend keeps the id outside the payload.
pub(crate) fn decode_document(id: Option<&str>, payload: &str) -> Result<Document, StoreError> {
    let stored: StoredDocument = serde_json::from_str(payload)?;
    let id = match (id, stored.id.as_deref()) {
        (Some(id), _) | (None, Some(id)) => DocumentId::new(id),
        (None, None) => {
            return Err(StoreError::Protocol("document without _id".to_string()));
        }
    };

    // An explicit but unusable `_parent` leaves the parent unknown; the
    // orphan check reports such documents as malformed.
    let parent = match stored.parent {
        Some(Value::String(parent)) => Some(DocumentId::from(parent)),
        Some(Value::Null) | None => id.derived_parent().or_else(|| {
            match stored.path {
                Some(Value::String(path)) => DocumentId::from_path(&path).derived_parent(),
                _ => None,
            }
        }),
        Some(other) => {
            debug!("document {id}: unusable _parent {other}");
            None
        }
    };

    let deleted = match stored.deleted {
        Some(Value::Bool(deleted)) => deleted,
        Some(Value::Null) | None => false,
        Some(other) => {
            debug!("document {id}: unusable _deleted {other}, treated as live");
            false
        }
    };
    // Unknown means the node may have children.
    let children = match stored.children {
        Some(Value::Bool(children)) => children,
        Some(Value::Null) | None => false,
        Some(other) => {
            debug!("document {id}: unusable _children {other}");
            true
        }
    };

    let kind = if id.is_split() {
        DocumentKind::Split
    } else if deleted {
        DocumentKind::Deleted
    } else {
        DocumentKind::Node
    };

    Ok(Document::with_parent(id, parent)
        .kind_of(kind)
        .children(children))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_path_ids() {
        let doc = decode_document(None, r#"{"_id":"2:/a/x","_children":true}"#).unwrap();
        assert_eq!(doc.id().as_str(), "2:/a/x");
        assert_eq!(doc.parent_id().map(|p| p.as_str()), Some("1:/a"));
        assert_eq!(doc.kind(), DocumentKind::Node);
        assert!(doc.has_children());
    }

    #[test]
    fn long_path_ids_use_stored_path() {
        let doc = decode_document(
            None,
            r#"{"_id":"3:h0badc0de/leaf","_path":"/a/b/leaf"}"#,
        )
        .unwrap();
        assert_eq!(doc.parent_id().map(|p| p.as_str()), Some("2:/a/b"));
        assert!(!doc.has_children());
    }

    #[test]
    fn explicit_parent_wins() {
        let doc = decode_document(Some("root/a"), r#"{"_parent":"root"}"#).unwrap();
        assert_eq!(doc.id().as_str(), "root/a");
        assert_eq!(doc.parent_id().map(|p| p.as_str()), Some("root"));
    }

    #[test]
    fn classifies_deleted_and_split() {
        let deleted = decode_document(None, r#"{"_id":"1:/gone","_deleted":true}"#).unwrap();
        assert_eq!(deleted.kind(), DocumentKind::Deleted);
        let split = decode_document(None, r#"{"_id":"2:p/a/r1-0-1/0"}"#).unwrap();
        assert_eq!(split.kind(), DocumentKind::Split);
    }

    #[test]
    fn unknown_parent_is_none() {
        let doc = decode_document(None, r#"{"_id":"mystery"}"#).unwrap();
        assert_eq!(doc.parent_id(), None);
    }

    #[test]
    fn mistyped_parent_leaves_parent_unknown() {
        let doc = decode_document(None, r#"{"_id":"1:/a","_parent":5}"#).unwrap();
        assert_eq!(doc.id().as_str(), "1:/a");
        assert_eq!(doc.parent_id(), None);
        assert_eq!(doc.kind(), DocumentKind::Node);
    }

    #[test]
    fn mistyped_flags_do_not_fail_decoding() {
        let doc = decode_document(
            None,
            r#"{"_id":"2:/a/x","_deleted":"yes","_children":1,"_path":7}"#,
        )
        .unwrap();
        assert_eq!(doc.kind(), DocumentKind::Node);
        assert!(doc.has_children());
        assert_eq!(doc.parent_id().map(|p| p.as_str()), Some("1:/a"));
    }

    #[test]
    fn null_parent_falls_back_to_derived_parent() {
        let doc = decode_document(None, r#"{"_id":"2:/a/x","_parent":null}"#).unwrap();
        assert_eq!(doc.parent_id().map(|p| p.as_str()), Some("1:/a"));
    }

    #[test]
    fn non_json_payload_is_still_an_error() {
        assert!(matches!(
            decode_document(None, "{not json"),
            Err(StoreError::Json(_))
        ));
    }

    #[test]
    fn missing_id_is_protocol_error() {
        let err = decode_document(None, r#"{"_path":"/a"}"#).unwrap_err();
        assert!(matches!(err, StoreError::Protocol(_)));
    }
}

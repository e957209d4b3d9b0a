//! # Reachability Index
//!
//! Incremental reachability over parent edges delivered in arbitrary order.
//!
//! The index keeps two maps, split over id-hash buckets that are locked
//! independently:
//!
//! - the reachable set: ids known to hang off the root, kept only for ids
//!   that may still get children,
//! - the pending set: children whose parent has not been seen reachable yet,
//!   keyed by that parent id.
//!
//! Both live in the bucket of the *key* id, so "is `p` reachable?" and
//! "park child under `p`" happen under one lock, as do "mark `p` reachable"
//! and "take the children parked under `p`". That pairing is what keeps a
//! resolution from slipping between two concurrent workers.

use std::collections::hash_map::RandomState;
use std::collections::{HashMap, HashSet};
use std::hash::BuildHasher;
use std::mem;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::document::DocumentId;

/// A node and the parent it claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub id: DocumentId,
    pub parent: DocumentId,
    /// Keep `id` in the reachable set once resolved.
    pub retain: bool,
}

#[derive(Debug, Clone)]
struct PendingChild {
    id: DocumentId,
    retain: bool,
}

#[derive(Debug, Default)]
struct Bucket {
    reachable: HashSet<DocumentId>,
    pending: HashMap<DocumentId, Vec<PendingChild>>,
}

/// A child left unresolved when the index was drained.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Unresolved {
    pub id: DocumentId,
    pub parent: DocumentId,
}

pub struct ReachabilityIndex {
    buckets: Vec<Mutex<Bucket>>,
    hasher: RandomState,
}

impl ReachabilityIndex {
    pub fn new(root: &DocumentId, buckets: usize) -> Self {
        let index = Self {
            buckets: (0..buckets.max(1)).map(|_| Mutex::new(Bucket::default())).collect(),
            hasher: RandomState::new(),
        };
        index.lock(root).reachable.insert(root.clone());
        index
    }

    fn lock(&self, id: &DocumentId) -> MutexGuard<'_, Bucket> {
        let slot = (self.hasher.hash_one(id) as usize) % self.buckets.len();
        self.buckets[slot]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `edge`. Resolves it at once when the parent is already
    /// reachable, otherwise parks it under the parent.
    pub fn insert(&self, edge: Edge) {
        let resolved = {
            let mut bucket = self.lock(&edge.parent);
            if bucket.reachable.contains(&edge.parent) {
                true
            } else {
                bucket.pending.entry(edge.parent.clone()).or_default().push(PendingChild {
                    id: edge.id.clone(),
                    retain: edge.retain,
                });
                false
            }
        };
        if resolved {
            self.promote(edge.id, edge.retain);
        }
    }

    /// Mark `id` reachable and cascade through everything parked below it.
    ///
    /// Iterative: a chain parked in reverse order can be as deep
    /// as the tree.
    fn promote(&self, id: DocumentId, retain: bool) {
        let mut work = vec![PendingChild { id, retain }];
        while let Some(node) = work.pop() {
            let children = {
                let mut bucket = self.lock(&node.id);
                let children = bucket.pending.remove(&node.id);
                // A node with parked children evidently has children, flag or not.
                if node.retain || children.is_some() {
                    bucket.reachable.insert(node.id);
                }
                children
            };
            if let Some(children) = children {
                work.extend(children);
            }
        }
    }

    pub fn is_reachable(&self, id: &DocumentId) -> bool {
        self.lock(id).reachable.contains(id)
    }

    /// Number of ids held in the reachable set, root included.
    pub fn reachable_len(&self) -> usize {
        self.buckets
            .iter()
            .map(|b| b.lock().unwrap_or_else(PoisonError::into_inner).reachable.len())
            .sum()
    }

    pub fn pending_len(&self) -> usize {
        self.buckets
            .iter()
            .map(|b| {
                b.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .pending
                    .values()
                    .map(Vec::len)
                    .sum::<usize>()
            })
            .sum()
    }

    /// Empty the index and return every unresolved child, sorted by id.
    pub fn drain_unresolved(&self) -> Vec<Unresolved> {
        let mut out = Vec::new();
        for bucket in &self.buckets {
            let mut bucket = bucket.lock().unwrap_or_else(PoisonError::into_inner);
            bucket.reachable.clear();
            for (parent, children) in mem::take(&mut bucket.pending) {
                out.extend(children.into_iter().map(|child| Unresolved {
                    id: child.id,
                    parent: parent.clone(),
                }));
            }
        }
        out.sort();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(id: &str, parent: &str) -> Edge {
        Edge {
            id: DocumentId::new(id),
            parent: DocumentId::new(parent),
            retain: true,
        }
    }

    #[test]
    fn resolves_children_seen_before_parents() {
        let index = ReachabilityIndex::new(&DocumentId::new("0:/"), 4);
        index.insert(edge("3:/a/b/c", "2:/a/b"));
        index.insert(edge("2:/a/b", "1:/a"));
        assert_eq!(index.pending_len(), 2);

        index.insert(edge("1:/a", "0:/"));
        assert_eq!(index.pending_len(), 0);
        assert!(index.is_reachable(&DocumentId::new("3:/a/b/c")));
        assert!(index.drain_unresolved().is_empty());
    }

    #[test]
    fn deep_reverse_chain_does_not_recurse() {
        let index = ReachabilityIndex::new(&DocumentId::new("r"), 8);
        let depth = 200_000;
        for i in (1..=depth).rev() {
            index.insert(edge(&format!("n{i}"), &format!("n{}", i - 1)));
        }
        index.insert(edge("n0", "r"));
        assert_eq!(index.pending_len(), 0);
        assert!(index.is_reachable(&DocumentId::new(&format!("n{depth}"))));
    }

    #[test]
    fn leaves_are_not_retained() {
        let index = ReachabilityIndex::new(&DocumentId::new("0:/"), 4);
        index.insert(Edge {
            retain: false,
            ..edge("1:/leaf", "0:/")
        });
        assert!(!index.is_reachable(&DocumentId::new("1:/leaf")));
        assert_eq!(index.reachable_len(), 1);
    }

    #[test]
    fn unflagged_node_with_parked_children_is_kept() {
        let index = ReachabilityIndex::new(&DocumentId::new("0:/"), 4);
        index.insert(edge("2:/a/x", "1:/a"));
        index.insert(Edge {
            retain: false,
            ..edge("1:/a", "0:/")
        });
        assert!(index.is_reachable(&DocumentId::new("1:/a")));
        assert_eq!(index.pending_len(), 0);
    }

    #[test]
    fn drains_unresolved_sorted() {
        let index = ReachabilityIndex::new(&DocumentId::new("0:/"), 4);
        index.insert(edge("2:/z/b", "1:/z"));
        index.insert(edge("2:/z/a", "1:/z"));
        index.insert(edge("1:/a", "0:/"));
        let unresolved = index.drain_unresolved();
        let ids: Vec<&str> = unresolved.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["2:/z/a", "2:/z/b"]);
        assert_eq!(unresolved[0].parent.as_str(), "1:/z");
        assert_eq!(index.reachable_len(), 0);
    }
}

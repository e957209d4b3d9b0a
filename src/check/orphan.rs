//! # Orphan Check
//!
//! Finds live nodes whose parent is not reachable from the root, in a single
//! pass over documents that arrive in any order.
//!
//! Every live node contributes one edge (node, parent) to a shared
//! [`ReachabilityIndex`]. Edges are handed to a pool of worker threads over
//! a bounded channel; the workers resolve them against the index, cascading
//! through children parked under a parent that only shows up later. When the
//! scan ends, the channel is closed and the workers joined before anything
//! still parked is reported as an orphan.
//!
//! Deleted documents are not nodes: they never resolve anything, so children
//! of a deleted node end up reported. Split documents are ignored.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Sender, bounded};
use tracing::{debug, info};

use crate::check::reachability::{Edge, ReachabilityIndex};
use crate::check::{CheckError, DocumentProcessor};
use crate::constants::{MIN_ORPHAN_BUCKETS, ORPHAN_BUCKETS_PER_WORKER};
use crate::document::{Document, DocumentId, DocumentKind};
use crate::pipeline::events::{CheckResult, Finding, Severity};
use crate::pipeline::queue::ResultQueue;
use crate::store::ReferencePoint;

const CHECK_NAME: &str = "orphan";

pub struct OrphanCheck {
    root: DocumentId,
    index: Arc<ReachabilityIndex>,
    edge_tx: Option<Sender<Edge>>,
    handles: Vec<thread::JoinHandle<()>>,
    malformed: Vec<DocumentId>,
    examined: u64,
    retained: usize,
    trust_children_flag: bool,
}

impl OrphanCheck {
    pub fn new(
        reference: &ReferencePoint,
        workers: usize,
        queue_capacity: usize,
        trust_children_flag: bool,
    ) -> Self {
        let workers = workers.max(1);
        let buckets = workers
            .saturating_mul(ORPHAN_BUCKETS_PER_WORKER)
            .max(MIN_ORPHAN_BUCKETS);
        let index = Arc::new(ReachabilityIndex::new(&reference.root, buckets));
        let (edge_tx, edge_rx) = bounded::<Edge>(queue_capacity.max(1));

        let handles = (0..workers)
            .map(|_| {
                let rx = edge_rx.clone();
                let index = index.clone();
                thread::spawn(move || {
                    for edge in rx {
                        index.insert(edge);
                    }
                })
            })
            .collect();
        debug!("orphan check workers={} buckets={}", workers, buckets);

        Self {
            root: reference.root.clone(),
            index,
            edge_tx: Some(edge_tx),
            handles,
            malformed: Vec::new(),
            examined: 0,
            retained: 0,
            trust_children_flag,
        }
    }

    /// Ids that were held in the reachable set when the check finalized,
    /// root included.
    pub fn retained(&self) -> usize {
        self.retained
    }

    /// Close the edge channel and wait for the workers to drain it.
    fn join_workers(&mut self) -> Result<(), CheckError> {
        self.edge_tx = None;
        let mut failed = 0usize;
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                failed += 1;
            }
        }
        if failed > 0 {
            return Err(CheckError::Worker(format!(
                "{failed} orphan check worker(s) panicked"
            )));
        }
        Ok(())
    }
}

impl DocumentProcessor for OrphanCheck {
    fn name(&self) -> &str {
        CHECK_NAME
    }

    fn process_document(&mut self, doc: &Document, results: &ResultQueue) -> Result<(), CheckError> {
        if doc.kind() != DocumentKind::Node {
            return Ok(());
        }
        self.examined += 1;
        if doc.id() == &self.root {
            return Ok(());
        }

        let Some(parent) = doc.parent_id() else {
            self.malformed.push(doc.id().clone());
            results.publish(CheckResult::Finding(
                Finding::new(
                    CHECK_NAME,
                    Severity::Error,
                    "malformed document: missing parent reference",
                )
                .for_document(doc.id()),
            ))?;
            return Ok(());
        };

        let edge = Edge {
            id: doc.id().clone(),
            parent: parent.clone(),
            retain: !self.trust_children_flag || doc.has_children(),
        };
        let tx = self
            .edge_tx
            .as_ref()
            .ok_or_else(|| CheckError::Worker("orphan check already finalized".to_string()))?;
        tx.send(edge)
            .map_err(|_| CheckError::Worker("orphan check workers stopped".to_string()))
    }

    fn finalize(&mut self, results: &ResultQueue) -> Result<(), CheckError> {
        self.join_workers()?;

        self.retained = self.index.reachable_len();
        let unresolved = self.index.drain_unresolved();
        self.malformed.sort();
        // Parents that are themselves orphans: unresolved or parentless.
        let parked: HashSet<&DocumentId> = unresolved
            .iter()
            .map(|u| &u.id)
            .chain(self.malformed.iter())
            .collect();

        let mut orphans = 0u64;
        for entry in &unresolved {
            let description = if parked.contains(&entry.parent) {
                format!("orphaned node: ancestor {} is not reachable", entry.parent)
            } else {
                format!("orphaned node: missing parent {}", entry.parent)
            };
            results.publish(CheckResult::Finding(
                Finding::new(CHECK_NAME, Severity::Corruption, description)
                    .for_document(&entry.id)
                    .with_parent(Some(&entry.parent)),
            ))?;
            orphans += 1;
        }

        for id in self.malformed.drain(..) {
            results.publish(CheckResult::Finding(
                Finding::new(
                    CHECK_NAME,
                    Severity::Corruption,
                    "orphaned node: no parent reference",
                )
                .for_document(&id),
            ))?;
            orphans += 1;
        }

        info!(
            "orphan check done examined={} orphans={} reachable_retained={}",
            self.examined, orphans, self.retained
        );
        results.publish(CheckResult::status(format!(
            "orphan check orphans={} examined={}",
            orphans, self.examined
        )))?;
        Ok(())
    }
}

impl Drop for OrphanCheck {
    // Cancelled or failed scans skip finalize; the workers still get joined.
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            let _ = self.join_workers();
        }
    }
}

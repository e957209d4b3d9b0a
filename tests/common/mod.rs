//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use docstore_check::config::{CheckOptions, Config};
use docstore_check::document::{Document, DocumentId};
use docstore_check::output::{CollectingSink, ResultSink};
use docstore_check::pipeline::events::{CheckResult, Severity};
use docstore_check::pipeline::{self, RunReport};
use docstore_check::store::memory::MemoryStore;
use docstore_check::store::{DocumentScan, DocumentStore, ReferencePoint, StoreError};

// ============================================================================
// Fixtures
// ============================================================================

/// `{root, root/a, root/a/x, orphanParent/y}` with explicit parents;
/// `orphanParent` never appears as a document.
pub fn synthetic_docs() -> Vec<Document> {
    vec![
        Document::with_parent("root", None),
        Document::with_parent("root/a", Some(DocumentId::new("root"))),
        Document::with_parent("root/a/x", Some(DocumentId::new("root/a"))),
        Document::with_parent("orphanParent/y", Some(DocumentId::new("orphanParent"))),
    ]
}

pub fn synthetic_config() -> Config {
    Config {
        run_id: "test_run".to_string(),
        root_id: "root".to_string(),
        ..Config::default()
    }
}

/// A connected tree of `/n{i}` paths, `fanout` children per node. Only
/// documents that got children carry the children flag.
pub fn tree_docs(nodes: usize, fanout: usize) -> Vec<Document> {
    let mut paths = vec!["/".to_string()];
    let mut has_children = vec![false];
    let mut next_parent = 0usize;
    while paths.len() < nodes {
        let parent = paths[next_parent].clone();
        for c in 0..fanout {
            if paths.len() >= nodes {
                break;
            }
            let child = if parent == "/" {
                format!("/n{}", paths.len())
            } else {
                format!("{parent}/n{}_{c}", paths.len())
            };
            paths.push(child);
            has_children.push(false);
            has_children[next_parent] = true;
        }
        next_parent += 1;
    }
    paths
        .iter()
        .zip(has_children)
        .map(|(p, flagged)| Document::node(DocumentId::from_path(p)).children(flagged))
        .collect()
}

/// Deterministic Fisher-Yates shuffle (xorshift64).
pub fn shuffled(docs: &[Document], seed: u64) -> Vec<Document> {
    let mut out = docs.to_vec();
    let mut state = seed.max(1);
    for i in (1..out.len()).rev() {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let j = (state % (i as u64 + 1)) as usize;
        out.swap(i, j);
    }
    out
}

pub fn all_checks(workers: usize) -> CheckOptions {
    CheckOptions {
        summary: true,
        orphan: true,
        workers,
        ..CheckOptions::default()
    }
}

// ============================================================================
// Running
// ============================================================================

pub fn run_collect(
    cfg: &Config,
    opts: &CheckOptions,
    store: &dyn DocumentStore,
) -> (RunReport, Vec<CheckResult>) {
    let (sink, collected) = CollectingSink::new();
    let sinks: Vec<Box<dyn ResultSink>> = vec![Box::new(sink)];
    let report = pipeline::run_check(cfg, opts, store, sinks).expect("run");
    assert!(collected.is_closed(), "sinks must be closed after a run");
    (report, collected.results())
}

/// `(id, parent)` of every orphan finding, in stream order.
pub fn orphans(results: &[CheckResult]) -> Vec<(String, Option<String>)> {
    results
        .iter()
        .filter_map(|r| match r {
            CheckResult::Finding(f) if f.check == "orphan" && f.severity == Severity::Corruption => {
                Some((
                    f.id.as_ref().map(|id| id.to_string()).unwrap_or_default(),
                    f.parent.as_ref().map(|id| id.to_string()),
                ))
            }
            _ => None,
        })
        .collect()
}

pub fn statuses(results: &[CheckResult]) -> Vec<String> {
    results
        .iter()
        .filter_map(|r| match r {
            CheckResult::Status { text } => Some(text.clone()),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Stores
// ============================================================================

/// Sets the cancel flag while yielding the `after`-th document.
pub struct CancelAfterStore {
    pub inner: MemoryStore,
    pub after: usize,
    pub flag: Arc<AtomicBool>,
}

impl DocumentStore for CancelAfterStore {
    fn scan(&self, reference: &ReferencePoint) -> Result<DocumentScan<'_>, StoreError> {
        let flag = self.flag.clone();
        let after = self.after;
        let inner = self.inner.scan(reference)?;
        Ok(Box::new(inner.enumerate().map(move |(i, doc)| {
            if i + 1 >= after {
                flag.store(true, Ordering::SeqCst);
            }
            doc
        })))
    }

    fn estimated_count(&self, reference: &ReferencePoint) -> Option<u64> {
        self.inner.estimated_count(reference)
    }

    fn name(&self) -> &str {
        "cancel-after"
    }
}

/// Yields its documents, then fails like a dropped connection.
pub struct FailingStore {
    pub docs: Vec<Document>,
}

impl DocumentStore for FailingStore {
    fn scan(&self, _reference: &ReferencePoint) -> Result<DocumentScan<'_>, StoreError> {
        let docs = self.docs.iter().cloned().map(Ok);
        let failure = std::iter::once(Err(StoreError::Protocol("connection reset".to_string())));
        Ok(Box::new(docs.chain(failure)))
    }

    fn estimated_count(&self, _reference: &ReferencePoint) -> Option<u64> {
        None
    }

    fn name(&self) -> &str {
        "failing"
    }
}

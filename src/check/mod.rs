//! # Checks
//!
//! Per-document analyses run during a store scan. Each check sees every
//! document once, in scan order, and may publish results at any point; at
//! the end of the scan it is finalized exactly once.

pub mod composite;
pub mod orphan;
pub mod progress;
pub mod reachability;
pub mod summary;

use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::config::{CheckOptions, Config};
use crate::document::Document;
use crate::pipeline::queue::{QueueError, ResultQueue};
use crate::store::{DocumentStore, ReferencePoint};

pub use composite::CompositeProcessor;
pub use orphan::OrphanCheck;
pub use progress::{Eta, Progress};
pub use summary::Summary;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error("worker failure: {0}")]
    Worker(String),
    #[error("{0}")]
    Other(String),
}

/// An analysis fed with every scanned document.
pub trait DocumentProcessor {
    /// Name used to attribute findings and failures.
    fn name(&self) -> &str;

    fn process_document(&mut self, doc: &Document, results: &ResultQueue) -> Result<(), CheckError>;

    /// Called once after the last document, also for cancelled scans.
    fn finalize(&mut self, results: &ResultQueue) -> Result<(), CheckError>;
}

/// Compose the checks selected in `opts`, in their fixed order:
/// summary, progress, orphan.
pub fn build_processor(
    cfg: &Config,
    opts: &CheckOptions,
    store: &dyn DocumentStore,
    reference: &ReferencePoint,
) -> CompositeProcessor {
    let mut processors: Vec<Box<dyn DocumentProcessor>> = Vec::new();
    if opts.summary {
        processors.push(Box::new(Summary::new()));
    }
    if opts.progress {
        let interval = Duration::from_secs(cfg.progress_interval_secs);
        let progress = if opts.eta {
            let estimate = store.estimated_count(reference);
            info!("estimated document count={:?}", estimate);
            Progress::with_eta(Eta::new(estimate), cfg.progress_every_docs, interval)
        } else {
            Progress::new(cfg.progress_every_docs, interval)
        };
        processors.push(Box::new(progress));
    }
    if opts.orphan {
        processors.push(Box::new(OrphanCheck::new(
            reference,
            opts.workers,
            cfg.orphan_queue_capacity,
            cfg.trust_children_flag,
        )));
    }
    CompositeProcessor::compose(processors)
}

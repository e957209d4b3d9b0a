//! # Pipeline Module
//!
//! Orchestrates one check run: the store is scanned once on the calling
//! thread, every document goes through the composed checks, and the checks'
//! results travel over a bounded queue to a writer thread that renders them
//! into the sinks.

pub mod events;
pub mod queue;
pub mod writer;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};

use crate::check::{self, CompositeProcessor, DocumentProcessor};
use crate::config::{CheckOptions, Config};
use crate::output::ResultSink;
use crate::store::{DocumentStore, ReferencePoint};

use events::{CheckResult, format_duration};
use queue::{ResultQueue, result_queue};
use writer::{ResultWriter, WriterStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// Stopped by the cancel flag; results cover the documents seen so far.
    Cancelled,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Completed => "completed",
            RunOutcome::Cancelled => "cancelled",
        }
    }
}

/// What a finished run reports back to its caller.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub documents: u64,
    pub findings: u64,
    pub sink_errors: u64,
    pub elapsed: Duration,
}

/// Run the configured checks over every document in `store`.
pub fn run_check(
    cfg: &Config,
    opts: &CheckOptions,
    store: &dyn DocumentStore,
    sinks: Vec<Box<dyn ResultSink>>,
) -> Result<RunReport> {
    CheckRunner::new(cfg, opts, store, None).run(sinks)
}

/// Run with an external cancellation flag (e.g., Ctrl+C).
///
/// Once the flag is set no further documents are pulled; the checks are
/// still finalized so partial results get reported, and the run ends as
/// [`RunOutcome::Cancelled`].
pub fn run_check_with_cancel(
    cfg: &Config,
    opts: &CheckOptions,
    store: &dyn DocumentStore,
    sinks: Vec<Box<dyn ResultSink>>,
    cancel_flag: Arc<AtomicBool>,
) -> Result<RunReport> {
    CheckRunner::new(cfg, opts, store, Some(cancel_flag)).run(sinks)
}

struct ScanOutcome {
    documents: u64,
    cancelled: bool,
}

struct CheckRunner<'a> {
    cfg: &'a Config,
    opts: &'a CheckOptions,
    store: &'a dyn DocumentStore,
    reference: ReferencePoint,
    cancel_flag: Option<Arc<AtomicBool>>,
}

impl<'a> CheckRunner<'a> {
    fn new(
        cfg: &'a Config,
        opts: &'a CheckOptions,
        store: &'a dyn DocumentStore,
        cancel_flag: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            cfg,
            opts,
            store,
            reference: ReferencePoint::new(cfg.root_id.as_str()),
            cancel_flag,
        }
    }

    fn run(self, sinks: Vec<Box<dyn ResultSink>>) -> Result<RunReport> {
        self.opts.validate()?;
        let start_time = Instant::now();

        let (queue, rx) = result_queue(self.cfg.queue_capacity);
        let writer_handle = ResultWriter::new(rx, sinks).spawn();

        let mut processor =
            check::build_processor(self.cfg, self.opts, self.store, &self.reference);
        info!(
            "starting run_id={} store={} root={} checks={:?} workers={}",
            self.cfg.run_id,
            self.store.name(),
            self.reference.root,
            processor.names(),
            self.opts.workers
        );

        let scanned = self
            .publish_header(&queue)
            .and_then(|()| self.scan_loop(&mut processor, &queue));

        let result = match scanned {
            Ok(outcome) => self.finalize(processor, &queue, outcome, start_time),
            Err(err) => {
                // Partial orphan results would be false positives; skip finalize.
                drop(processor);
                let _ = queue.publish(CheckResult::status(format!("run failed: {err:#}")));
                Err(err)
            }
        };

        if let Err(err) = queue.publish_end() {
            warn!("result writer gone before end marker: {err}");
        }
        let stats = writer_handle
            .join()
            .map_err(|_| anyhow!("result writer panicked"))?;

        let (outcome, documents) = result?;
        let report = RunReport {
            outcome,
            documents,
            findings: stats.findings,
            sink_errors: stats.sink_errors,
            elapsed: start_time.elapsed(),
        };
        log_report(&report, &stats);
        Ok(report)
    }

    fn publish_header(&self, queue: &ResultQueue) -> Result<()> {
        let header = format!(
            "check run_id={} store={} root={}",
            self.cfg.run_id,
            self.store.name(),
            self.reference.root
        );
        queue
            .publish(CheckResult::status(header))
            .context("result queue closed before scan")
    }

    fn scan_loop(
        &self,
        processor: &mut CompositeProcessor,
        queue: &ResultQueue,
    ) -> Result<ScanOutcome> {
        let mut scan = self
            .store
            .scan(&self.reference)
            .with_context(|| format!("failed to start {} scan", self.store.name()))?;
        let mut documents = 0u64;
        let mut cancelled = false;

        loop {
            if let Some(flag) = &self.cancel_flag {
                if flag.load(Ordering::Relaxed) {
                    cancelled = true;
                    break;
                }
            }
            let doc = match scan.next() {
                Some(doc) => doc.with_context(|| {
                    format!("{} scan failed after {documents} documents", self.store.name())
                })?,
                None => break,
            };
            documents += 1;
            processor
                .process_document(&doc, queue)
                .with_context(|| format!("result delivery failed at {}", doc.id()))?;
        }

        Ok(ScanOutcome {
            documents,
            cancelled,
        })
    }

    fn finalize(
        &self,
        mut processor: CompositeProcessor,
        queue: &ResultQueue,
        outcome: ScanOutcome,
        start_time: Instant,
    ) -> Result<(RunOutcome, u64)> {
        if outcome.cancelled {
            info!("shutdown requested; stopping early");
        }
        processor
            .finalize(queue)
            .context("result delivery failed while finalizing checks")?;
        drop(processor);

        let run_outcome = if outcome.cancelled {
            RunOutcome::Cancelled
        } else {
            RunOutcome::Completed
        };
        queue
            .publish(CheckResult::status(format!(
                "run {} documents={} elapsed={}",
                run_outcome.as_str(),
                outcome.documents,
                format_duration(start_time.elapsed())
            )))
            .context("result queue closed before run status")?;
        Ok((run_outcome, outcome.documents))
    }
}

fn log_report(report: &RunReport, stats: &WriterStats) {
    info!(
        "run_summary outcome={} documents={} findings={} rendered={} sink_errors={} elapsed={}",
        report.outcome.as_str(),
        report.documents,
        report.findings,
        stats.rendered,
        report.sink_errors,
        format_duration(report.elapsed)
    );
}

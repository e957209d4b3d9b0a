//! Periodic progress updates, optionally with a remaining-time projection
//! from the store's estimated document count. The estimate is advisory: a
//! stale or wrong estimate only skews the projection.

use std::time::{Duration, Instant};

use crate::check::{CheckError, DocumentProcessor};
use crate::document::Document;
use crate::pipeline::events::{CheckResult, ProgressUpdate, Remaining};
use crate::pipeline::queue::ResultQueue;

/// Remaining-time projection against an estimated total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eta {
    estimated_total: Option<u64>,
}

impl Eta {
    pub fn new(estimated_total: Option<u64>) -> Self {
        Self { estimated_total }
    }

    /// `elapsed * (total - seen) / seen`; unknown without an estimate or
    /// before the first document. Overshooting the estimate projects zero; a
    /// projection too large to represent is unknown.
    pub fn remaining(&self, seen: u64, elapsed: Duration) -> Remaining {
        match self.estimated_total {
            Some(total) if seen > 0 => {
                let left = total.saturating_sub(seen);
                let secs = elapsed.as_secs_f64() * left as f64 / seen as f64;
                Duration::try_from_secs_f64(secs).map_or(Remaining::Unknown, Remaining::Known)
            }
            _ => Remaining::Unknown,
        }
    }

    pub fn fraction(&self, seen: u64) -> Option<f64> {
        match self.estimated_total {
            Some(0) => Some(1.0),
            Some(total) => Some((seen as f64 / total as f64).min(1.0)),
            None => None,
        }
    }
}

pub struct Progress {
    processed: u64,
    every_docs: u64,
    interval: Duration,
    started: Instant,
    last_emit: Instant,
    eta: Option<Eta>,
}

impl Progress {
    /// Report every `every_docs` documents (0 disables the count cadence) or
    /// every `interval`, whichever comes first.
    pub fn new(every_docs: u64, interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            processed: 0,
            every_docs,
            interval,
            started: now,
            last_emit: now,
            eta: None,
        }
    }

    pub fn with_eta(eta: Eta, every_docs: u64, interval: Duration) -> Self {
        Self {
            eta: Some(eta),
            ..Self::new(every_docs, interval)
        }
    }

    fn due(&self) -> bool {
        let by_count = self.every_docs > 0 && self.processed % self.every_docs == 0;
        let by_time = !self.interval.is_zero() && self.last_emit.elapsed() >= self.interval;
        by_count || by_time
    }

    fn snapshot(&self) -> ProgressUpdate {
        build_update(self.processed, self.started.elapsed(), self.eta.as_ref())
    }
}

/// Assemble a progress update for `processed` documents after `elapsed`.
pub fn build_update(processed: u64, elapsed: Duration, eta: Option<&Eta>) -> ProgressUpdate {
    match eta {
        Some(eta) => ProgressUpdate {
            processed,
            fraction: eta.fraction(processed),
            elapsed,
            eta: eta.remaining(processed, elapsed),
        },
        None => ProgressUpdate {
            processed,
            fraction: None,
            elapsed,
            eta: Remaining::Untracked,
        },
    }
}

impl DocumentProcessor for Progress {
    fn name(&self) -> &str {
        if self.eta.is_some() { "eta" } else { "progress" }
    }

    fn process_document(&mut self, _doc: &Document, results: &ResultQueue) -> Result<(), CheckError> {
        self.processed += 1;
        if self.due() {
            results.publish(CheckResult::Progress(self.snapshot()))?;
            self.last_emit = Instant::now();
        }
        Ok(())
    }

    fn finalize(&mut self, results: &ResultQueue) -> Result<(), CheckError> {
        results.publish(CheckResult::Progress(self.snapshot()))?;
        Ok(())
    }
}

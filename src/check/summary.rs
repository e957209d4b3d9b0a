use std::collections::BTreeMap;
use std::time::Instant;

use crate::check::{CheckError, DocumentProcessor};
use crate::document::{Document, DocumentKind};
use crate::pipeline::events::{CheckResult, format_duration};
use crate::pipeline::queue::ResultQueue;

/// Counts documents by kind and reports the totals at the end of the scan.
pub struct Summary {
    total: u64,
    by_kind: BTreeMap<DocumentKind, u64>,
    started: Instant,
}

impl Summary {
    pub fn new() -> Self {
        Self {
            total: 0,
            by_kind: BTreeMap::new(),
            started: Instant::now(),
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn count(&self, kind: DocumentKind) -> u64 {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }
}

impl Default for Summary {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentProcessor for Summary {
    fn name(&self) -> &str {
        "summary"
    }

    fn process_document(&mut self, doc: &Document, _results: &ResultQueue) -> Result<(), CheckError> {
        self.total += 1;
        *self.by_kind.entry(doc.kind()).or_insert(0) += 1;
        Ok(())
    }

    fn finalize(&mut self, results: &ResultQueue) -> Result<(), CheckError> {
        for (kind, count) in &self.by_kind {
            results.publish(CheckResult::status(format!(
                "summary kind={kind} documents={count}"
            )))?;
        }
        results.publish(CheckResult::status(format!(
            "summary total documents={} elapsed={}",
            self.total,
            format_duration(self.started.elapsed())
        )))?;
        Ok(())
    }
}

//! # Result Writer
//!
//! Single consumer of the result queue. Renders every result into each sink
//! in order until the terminal sentinel arrives, then closes the sinks.

use std::thread;

use tracing::{debug, warn};

use crate::output::ResultSink;

use super::events::CheckResult;
use super::queue::ResultReceiver;

/// Counters reported by the writer once it has drained the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub rendered: u64,
    pub findings: u64,
    pub sink_errors: u64,
    /// False when the producers vanished without sending the sentinel.
    pub saw_end: bool,
}

pub struct ResultWriter {
    rx: ResultReceiver,
    sinks: SinkSet,
}

impl ResultWriter {
    pub fn new(rx: ResultReceiver, sinks: Vec<Box<dyn ResultSink>>) -> Self {
        Self {
            rx,
            sinks: SinkSet {
                sinks,
                closed: false,
            },
        }
    }

    pub fn spawn(self) -> thread::JoinHandle<WriterStats> {
        thread::spawn(move || self.run())
    }

    pub fn run(mut self) -> WriterStats {
        let mut stats = WriterStats::default();
        while let Some(result) = self.rx.recv() {
            if result.is_end() {
                stats.saw_end = true;
                break;
            }
            if matches!(result, CheckResult::Finding(_)) {
                stats.findings += 1;
            }
            stats.sink_errors += self.sinks.render(&result);
            stats.rendered += 1;
        }
        if !stats.saw_end {
            warn!("result queue closed without end marker");
        }
        stats.sink_errors += self.sinks.close_all();
        debug!(
            "result writer done rendered={} findings={} sink_errors={}",
            stats.rendered, stats.findings, stats.sink_errors
        );
        stats
    }
}

/// Owns the sinks and closes them on every exit path, unwinding included.
struct SinkSet {
    sinks: Vec<Box<dyn ResultSink>>,
    closed: bool,
}

impl SinkSet {
    fn render(&mut self, result: &CheckResult) -> u64 {
        let mut errors = 0;
        for sink in &mut self.sinks {
            if let Err(err) = sink.write(result) {
                errors += 1;
                warn!("result sink {} write error: {err}", sink.name());
            }
        }
        errors
    }

    fn close_all(&mut self) -> u64 {
        if self.closed {
            return 0;
        }
        self.closed = true;
        let mut errors = 0;
        for sink in &mut self.sinks {
            if let Err(err) = sink.close() {
                errors += 1;
                warn!("result sink {} close error: {err}", sink.name());
            }
        }
        errors
    }
}

impl Drop for SinkSet {
    fn drop(&mut self) {
        self.close_all();
    }
}

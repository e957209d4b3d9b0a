//! # Result Queue
//!
//! Bounded FIFO between the checks and the result writer. `publish` blocks
//! while the queue is full, so a slow sink throttles the scan instead of
//! letting results pile up in memory.

use crossbeam_channel::{Receiver, Sender, bounded};
use thiserror::Error;

use super::events::CheckResult;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("result queue closed")]
    Closed,
}

/// Producer side of the result queue.
#[derive(Debug, Clone)]
pub struct ResultQueue {
    tx: Sender<CheckResult>,
}

/// Consumer side of the result queue.
#[derive(Debug)]
pub struct ResultReceiver {
    rx: Receiver<CheckResult>,
}

pub fn result_queue(capacity: usize) -> (ResultQueue, ResultReceiver) {
    let (tx, rx) = bounded(capacity.max(1));
    (ResultQueue { tx }, ResultReceiver { rx })
}

impl ResultQueue {
    /// Enqueue a result, blocking while the queue is at capacity.
    pub fn publish(&self, result: CheckResult) -> Result<(), QueueError> {
        self.tx.send(result).map_err(|_| QueueError::Closed)
    }

    /// Enqueue the terminal sentinel. Consumes this producer.
    pub fn publish_end(self) -> Result<(), QueueError> {
        self.publish(CheckResult::End)
    }
}

impl ResultReceiver {
    /// Next result in FIFO order. `None` once every producer is gone.
    pub fn recv(&self) -> Option<CheckResult> {
        self.rx.recv().ok()
    }
}

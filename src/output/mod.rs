//! # Result Output
//!
//! Sinks the result writer renders into: the console and an optional result
//! file in text, JSONL or CSV form. Every sink writes one result per line.

pub mod csv;
pub mod jsonl;
pub mod text;

use std::fs::File;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

use crate::pipeline::events::CheckResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Jsonl,
    Csv,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("other error: {0}")]
    Other(String),
}

/// Destination for rendered results.
///
/// Sinks are owned by the result writer thread and closed exactly once,
/// after the last result or when the writer unwinds.
pub trait ResultSink: Send {
    fn name(&self) -> &str;
    fn write(&mut self, result: &CheckResult) -> Result<(), SinkError>;
    fn close(&mut self) -> Result<(), SinkError>;
}

/// Build the configured sinks. Failing to open the result file is fatal.
pub fn build_sinks(
    silent: bool,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<Vec<Box<dyn ResultSink>>, SinkError> {
    let mut sinks: Vec<Box<dyn ResultSink>> = Vec::new();
    if !silent {
        sinks.push(Box::new(text::TextSink::stdout()));
    }
    if let Some(path) = output {
        let file = File::create(path)?;
        let sink: Box<dyn ResultSink> = match format {
            OutputFormat::Text => Box::new(text::TextSink::file(file)),
            OutputFormat::Jsonl => Box::new(jsonl::JsonlSink::new(file)),
            OutputFormat::Csv => Box::new(csv::CsvSink::new(file)?),
        };
        sinks.push(sink);
    }
    Ok(sinks)
}

/// Shared view of what a [`CollectingSink`] received.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    inner: Arc<Mutex<CollectedState>>,
}

#[derive(Debug, Default)]
struct CollectedState {
    results: Vec<CheckResult>,
    closed: bool,
}

impl Collected {
    pub fn results(&self) -> Vec<CheckResult> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .results
            .clone()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).closed
    }
}

/// Sink keeping results in memory, for embedding the checker in other tools.
#[derive(Debug, Default)]
pub struct CollectingSink {
    collected: Collected,
}

impl CollectingSink {
    pub fn new() -> (Self, Collected) {
        let sink = Self::default();
        let handle = sink.collected.clone();
        (sink, handle)
    }
}

impl ResultSink for CollectingSink {
    fn name(&self) -> &str {
        "memory"
    }

    fn write(&mut self, result: &CheckResult) -> Result<(), SinkError> {
        self.collected
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .results
            .push(result.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.collected
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .closed = true;
        Ok(())
    }
}

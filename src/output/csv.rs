use std::fs::File;

use serde::Serialize;

use crate::output::{ResultSink, SinkError};
use crate::pipeline::events::CheckResult;

/// Flat CSV rendering; columns that do not apply to a row stay empty.
pub struct CsvSink {
    writer: csv::Writer<File>,
}

#[derive(Serialize)]
struct ResultCsv<'a> {
    kind: &'a str,
    check: Option<&'a str>,
    severity: Option<&'a str>,
    id: Option<&'a str>,
    parent: Option<&'a str>,
    text: Option<String>,
    processed: Option<u64>,
    fraction: Option<f64>,
    elapsed_secs: Option<f64>,
    eta_secs: Option<f64>,
}

impl CsvSink {
    pub fn new(file: File) -> Result<Self, SinkError> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record([
            "kind",
            "check",
            "severity",
            "id",
            "parent",
            "text",
            "processed",
            "fraction",
            "elapsed_secs",
            "eta_secs",
        ])?;
        Ok(Self { writer })
    }
}

impl ResultSink for CsvSink {
    fn name(&self) -> &str {
        "csv"
    }

    fn write(&mut self, result: &CheckResult) -> Result<(), SinkError> {
        let mut row = ResultCsv {
            kind: result.kind(),
            check: None,
            severity: None,
            id: None,
            parent: None,
            text: None,
            processed: None,
            fraction: None,
            elapsed_secs: None,
            eta_secs: None,
        };
        match result {
            CheckResult::Finding(finding) => {
                row.check = Some(finding.check.as_str());
                row.severity = Some(finding.severity.as_str());
                row.id = finding.id.as_ref().map(|id| id.as_str());
                row.parent = finding.parent.as_ref().map(|id| id.as_str());
                row.text = Some(finding.description.clone());
            }
            CheckResult::Status { text } => row.text = Some(text.clone()),
            CheckResult::Progress(update) => {
                row.processed = Some(update.processed);
                row.fraction = update.fraction;
                row.elapsed_secs = Some(update.elapsed.as_secs_f64());
                row.eta_secs = update.eta.as_secs();
            }
            CheckResult::End => return Ok(()),
        }
        self.writer.serialize(row)?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

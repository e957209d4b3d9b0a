use std::fs::File;
use std::io::{BufWriter, Write};

use crate::output::{ResultSink, SinkError};
use crate::pipeline::events::CheckResult;

/// One JSON object per line, tagged by `type`.
pub struct JsonlSink {
    writer: BufWriter<File>,
}

impl JsonlSink {
    pub fn new(file: File) -> Self {
        Self {
            writer: BufWriter::new(file),
        }
    }
}

impl ResultSink for JsonlSink {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn write(&mut self, result: &CheckResult) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, result)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

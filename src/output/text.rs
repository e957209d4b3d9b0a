use std::fs::File;
use std::io::{BufWriter, Stdout, Write};

use crate::output::{ResultSink, SinkError};
use crate::pipeline::events::CheckResult;

/// Plain-text sink: the `Display` form of each result on its own line.
pub struct TextSink<W: Write + Send> {
    name: &'static str,
    writer: BufWriter<W>,
    // Console output is flushed per line so progress shows up immediately.
    flush_each: bool,
}

impl TextSink<Stdout> {
    pub fn stdout() -> Self {
        Self {
            name: "console",
            writer: BufWriter::new(std::io::stdout()),
            flush_each: true,
        }
    }
}

impl TextSink<File> {
    pub fn file(file: File) -> Self {
        Self {
            name: "text",
            writer: BufWriter::new(file),
            flush_each: false,
        }
    }
}

impl<W: Write + Send> ResultSink for TextSink<W> {
    fn name(&self) -> &str {
        self.name
    }

    fn write(&mut self, result: &CheckResult) -> Result<(), SinkError> {
        writeln!(self.writer, "{result}")?;
        if self.flush_each {
            self.writer.flush()?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_one_line_per_result() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.txt");
        let mut sink = TextSink::file(File::create(&path).expect("create"));
        sink.write(&CheckResult::status("first")).expect("write");
        sink.write(&CheckResult::status("second")).expect("write");
        sink.close().expect("close");

        let content = std::fs::read_to_string(&path).expect("read");
        assert_eq!(content, "first\nsecond\n");
    }
}

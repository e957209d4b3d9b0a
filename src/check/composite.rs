use tracing::warn;

use crate::check::{CheckError, DocumentProcessor};
use crate::document::Document;
use crate::pipeline::events::{CheckResult, Finding, Severity};
use crate::pipeline::queue::ResultQueue;

/// Runs a fixed list of checks in registration order.
///
/// A check returning an error is reported as a finding attributed to it and
/// the remaining checks still run. Only a closed result queue escapes, since
/// nothing can be reported after that.
pub struct CompositeProcessor {
    processors: Vec<Box<dyn DocumentProcessor>>,
}

impl CompositeProcessor {
    pub fn compose(processors: Vec<Box<dyn DocumentProcessor>>) -> Self {
        Self { processors }
    }

    pub fn names(&self) -> Vec<&str> {
        self.processors.iter().map(|p| p.name()).collect()
    }
}

fn report_failure(
    check: &str,
    doc: Option<&Document>,
    err: CheckError,
    results: &ResultQueue,
) -> Result<(), CheckError> {
    if let CheckError::Queue(_) = err {
        return Err(err);
    }
    let mut finding = match doc {
        Some(doc) => {
            warn!("check {check} failed on {}: {err}", doc.id());
            Finding::new(check, Severity::Error, format!("check failed: {err}")).for_document(doc.id())
        }
        None => {
            warn!("check {check} failed to finalize: {err}");
            Finding::new(check, Severity::Error, format!("finalize failed: {err}"))
        }
    };
    if let Some(doc) = doc {
        finding = finding.with_parent(doc.parent_id());
    }
    results.publish(CheckResult::Finding(finding))?;
    Ok(())
}

impl DocumentProcessor for CompositeProcessor {
    fn name(&self) -> &str {
        "composite"
    }

    fn process_document(&mut self, doc: &Document, results: &ResultQueue) -> Result<(), CheckError> {
        for processor in &mut self.processors {
            if let Err(err) = processor.process_document(doc, results) {
                report_failure(processor.name(), Some(doc), err, results)?;
            }
        }
        Ok(())
    }

    fn finalize(&mut self, results: &ResultQueue) -> Result<(), CheckError> {
        for processor in &mut self.processors {
            if let Err(err) = processor.finalize(results) {
                report_failure(processor.name(), None, err, results)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::queue::{ResultReceiver, result_queue};

    /// Records every call as a status result.
    struct Echo(&'static str);

    impl DocumentProcessor for Echo {
        fn name(&self) -> &str {
            self.0
        }

        fn process_document(&mut self, doc: &Document, results: &ResultQueue) -> Result<(), CheckError> {
            results.publish(CheckResult::status(format!("{} saw {}", self.0, doc.id())))?;
            Ok(())
        }

        fn finalize(&mut self, results: &ResultQueue) -> Result<(), CheckError> {
            results.publish(CheckResult::status(format!("{} end", self.0)))?;
            Ok(())
        }
    }

    struct Broken;

    impl DocumentProcessor for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn process_document(&mut self, _doc: &Document, _results: &ResultQueue) -> Result<(), CheckError> {
            Err(CheckError::Other("boom".to_string()))
        }

        fn finalize(&mut self, _results: &ResultQueue) -> Result<(), CheckError> {
            Err(CheckError::Other("bust".to_string()))
        }
    }

    fn drain(rx: &ResultReceiver, queue: ResultQueue) -> Vec<CheckResult> {
        drop(queue);
        let mut out = Vec::new();
        while let Some(result) = rx.recv() {
            out.push(result);
        }
        out
    }

    #[test]
    fn fans_out_in_registration_order() {
        let (queue, rx) = result_queue(16);
        let mut composite = CompositeProcessor::compose(vec![Box::new(Echo("a")), Box::new(Echo("b"))]);
        composite.process_document(&Document::node("1:/x"), &queue).unwrap();
        composite.finalize(&queue).unwrap();

        let texts: Vec<String> = drain(&rx, queue).iter().map(|r| r.to_string()).collect();
        assert_eq!(texts, vec!["a saw 1:/x", "b saw 1:/x", "a end", "b end"]);
    }

    #[test]
    fn failing_check_is_isolated_and_attributed() {
        let (queue, rx) = result_queue(16);
        let mut composite = CompositeProcessor::compose(vec![
            Box::new(Echo("a")),
            Box::new(Broken),
            Box::new(Echo("c")),
        ]);
        composite.process_document(&Document::node("1:/x"), &queue).unwrap();
        composite.finalize(&queue).unwrap();

        let results = drain(&rx, queue);
        assert_eq!(results.len(), 6);
        match &results[1] {
            CheckResult::Finding(finding) => {
                assert_eq!(finding.check, "broken");
                assert_eq!(finding.id.as_ref().map(|id| id.as_str()), Some("1:/x"));
                assert!(finding.description.contains("boom"));
            }
            other => panic!("expected finding, got {other:?}"),
        }
        assert_eq!(results[2].to_string(), "c saw 1:/x");
        match &results[4] {
            CheckResult::Finding(finding) => {
                assert_eq!(finding.check, "broken");
                assert!(finding.id.is_none());
                assert!(finding.description.contains("bust"));
            }
            other => panic!("expected finding, got {other:?}"),
        }
        assert_eq!(results[5].to_string(), "c end");
    }

    #[test]
    fn closed_queue_is_propagated() {
        let (queue, rx) = result_queue(4);
        drop(rx);
        let mut composite = CompositeProcessor::compose(vec![Box::new(Echo("a"))]);
        let err = composite
            .process_document(&Document::node("1:/x"), &queue)
            .unwrap_err();
        assert!(matches!(err, CheckError::Queue(_)));
    }
}

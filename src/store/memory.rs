use crate::document::Document;
use crate::store::{DocumentScan, DocumentStore, ReferencePoint, StoreError};

/// Store backed by an in-memory document list, scanned in insertion order.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    documents: Vec<Document>,
    estimate: Option<u64>,
}

impl MemoryStore {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            estimate: None,
        }
    }

    pub fn with_estimate(mut self, estimate: u64) -> Self {
        self.estimate = Some(estimate);
        self
    }
}

impl DocumentStore for MemoryStore {
    fn scan(&self, _reference: &ReferencePoint) -> Result<DocumentScan<'_>, StoreError> {
        Ok(Box::new(self.documents.iter().cloned().map(Ok)))
    }

    fn estimated_count(&self, _reference: &ReferencePoint) -> Option<u64> {
        self.estimate
    }

    fn name(&self) -> &str {
        "memory"
    }
}

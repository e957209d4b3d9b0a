use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::store::{DocumentScan, DocumentStore, ReferencePoint, StoreError, decode_document};

/// Store backed by a document dump with one JSON document per line.
pub struct JsonlStore {
    path: PathBuf,
}

impl JsonlStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(StoreError::Protocol(format!(
                "not a document dump: {}",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl DocumentStore for JsonlStore {
    fn scan(&self, _reference: &ReferencePoint) -> Result<DocumentScan<'_>, StoreError> {
        let reader = BufReader::new(File::open(&self.path)?);
        debug!("jsonl scan path={}", self.path.display());
        let docs = reader
            .lines()
            .enumerate()
            .filter(|(_, line)| line.as_ref().map_or(true, |l| !l.trim().is_empty()))
            .map(|(idx, line)| {
                let line = line?;
                decode_document(None, &line).map_err(|err| {
                    StoreError::Protocol(format!("line {}: {err}", idx + 1))
                })
            });
        Ok(Box::new(docs))
    }

    // A line count would need a full pass over the dump.
    fn estimated_count(&self, _reference: &ReferencePoint) -> Option<u64> {
        None
    }

    fn name(&self) -> &str {
        "jsonl"
    }
}

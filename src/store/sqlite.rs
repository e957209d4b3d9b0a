use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, params};
use tracing::{debug, warn};

use crate::document::Document;
use crate::store::{DocumentScan, DocumentStore, ReferencePoint, StoreError, decode_document};

/// Store backed by a SQLite `nodes(id TEXT PRIMARY KEY, data TEXT)` table.
///
/// Scans page through the table by id (keyset pagination) inside one read
/// transaction, so every page sees the same snapshot.
pub struct SqliteStore {
    path: PathBuf,
    batch_size: usize,
}

impl SqliteStore {
    pub fn open(path: &Path, batch_size: usize) -> Result<Self, StoreError> {
        let conn = open_read_only(path)?;
        if !has_table(&conn, "nodes")? {
            return Err(StoreError::Protocol(format!(
                "no nodes table in {}",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
            batch_size: batch_size.max(1),
        })
    }
}

fn open_read_only(path: &Path) -> Result<Connection, StoreError> {
    Ok(Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?)
}

fn has_table(conn: &Connection, name: &str) -> Result<bool, StoreError> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table' AND name=?1")?;
    let mut rows = stmt.query([name])?;
    Ok(rows.next()?.is_some())
}

impl DocumentStore for SqliteStore {
    fn scan(&self, _reference: &ReferencePoint) -> Result<DocumentScan<'_>, StoreError> {
        let conn = open_read_only(&self.path)?;
        conn.execute_batch("BEGIN DEFERRED")?;
        Ok(Box::new(SqliteScan {
            conn,
            batch_size: self.batch_size,
            last_id: String::new(),
            buffer: VecDeque::new(),
            done: false,
        }))
    }

    fn estimated_count(&self, _reference: &ReferencePoint) -> Option<u64> {
        let conn = match open_read_only(&self.path) {
            Ok(conn) => conn,
            Err(err) => {
                warn!("sqlite count estimate unavailable: {err}");
                return None;
            }
        };
        // MAX(rowid) reads one b-tree edge; deletions make it an overestimate.
        match conn.query_row("SELECT MAX(rowid) FROM nodes", [], |row| {
            row.get::<_, Option<i64>>(0)
        }) {
            Ok(count) => count.map(|c| c.max(0) as u64),
            Err(err) => {
                warn!("sqlite count estimate failed: {err}");
                None
            }
        }
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

struct SqliteScan {
    conn: Connection,
    batch_size: usize,
    last_id: String,
    buffer: VecDeque<Document>,
    done: bool,
}

impl SqliteScan {
    fn fetch_batch(&mut self) -> Result<(), StoreError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, data FROM nodes WHERE id > ?1 ORDER BY id LIMIT ?2")?;
        let rows = stmt.query_map(params![self.last_id, self.batch_size as i64], |row| {
            let id: String = row.get(0)?;
            let data: String = row.get(1)?;
            Ok((id, data))
        })?;

        let mut batch = Vec::with_capacity(self.batch_size);
        let mut last_id = None;
        for row in rows {
            let (id, data) = row?;
            let doc = decode_document(Some(&id), &data)
                .map_err(|err| StoreError::Protocol(format!("row {id}: {err}")))?;
            batch.push(doc);
            last_id = Some(id);
        }
        debug!("sqlite batch fetched={} last_id={:?}", batch.len(), last_id);
        if batch.len() < self.batch_size {
            self.done = true;
        }
        if let Some(id) = last_id {
            self.last_id = id;
        }
        self.buffer.extend(batch);
        Ok(())
    }
}

impl Iterator for SqliteScan {
    type Item = Result<Document, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.done {
            if let Err(err) = self.fetch_batch() {
                self.done = true;
                return Some(Err(err));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

impl Drop for SqliteScan {
    fn drop(&mut self) {
        if let Err(err) = self.conn.execute_batch("COMMIT") {
            debug!("sqlite scan transaction close: {err}");
        }
    }
}

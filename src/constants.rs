//! Shared defaults.

/// Id of the tree root in the `<depth>:<path>` id layout.
pub const DEFAULT_ROOT_ID: &str = "0:/";

/// Result queue capacity; publishers block beyond this.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

pub const DEFAULT_PROGRESS_EVERY_DOCS: u64 = 100_000;
pub const DEFAULT_PROGRESS_INTERVAL_SECS: u64 = 10;

/// Page size for stores that paginate by id.
pub const DEFAULT_SCAN_BATCH_SIZE: usize = 1000;

/// Capacity of the channel feeding orphan check workers.
pub const DEFAULT_ORPHAN_QUEUE_CAPACITY: usize = 4096;

/// Lock buckets per orphan check worker.
pub const ORPHAN_BUCKETS_PER_WORKER: usize = 16;
pub const MIN_ORPHAN_BUCKETS: usize = 64;

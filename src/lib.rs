//! # docstore-check
//!
//! Streaming consistency checker for tree-structured document stores. One
//! forward scan feeds every document through a fixed set of checks (summary,
//! progress/ETA, orphan detection) whose results are rendered by a dedicated
//! writer thread behind a bounded queue.

pub mod check;
pub mod cli;
pub mod config;
pub mod constants;
pub mod document;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod store;
pub mod util;

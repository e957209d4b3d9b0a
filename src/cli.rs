use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Jsonl,
    Sqlite,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultFormat {
    Text,
    Jsonl,
    Csv,
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CliOptions {
    /// Document store to check (JSONL dump or SQLite database)
    #[arg(short, long)]
    pub store: PathBuf,

    /// Store backend
    #[arg(long, value_enum, default_value_t = StoreBackend::Jsonl)]
    pub store_kind: StoreBackend,

    /// Optional path to config file (YAML)
    #[arg(long)]
    pub config_path: Option<PathBuf>,

    /// Report document counts by kind
    #[arg(long)]
    pub summary: bool,

    /// Report progress while scanning
    #[arg(long)]
    pub progress: bool,

    /// Project remaining time from the store's estimated count (needs --progress)
    #[arg(long)]
    pub eta: bool,

    /// Detect nodes whose parent is not reachable from the root
    #[arg(long)]
    pub orphan: bool,

    /// Number of orphan check worker threads
    #[arg(long, default_value_t = num_cpus::get())]
    pub workers: usize,

    /// Write results to this file as well
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Result file format
    #[arg(long, value_enum, default_value_t = ResultFormat::Text)]
    pub format: ResultFormat,

    /// Do not print results to the console
    #[arg(long)]
    pub silent: bool,

    /// Root id (overrides config)
    #[arg(long)]
    pub root_id: Option<String>,
}

pub fn parse() -> CliOptions {
    CliOptions::parse()
}

//! # Utility Module
//!
//! Glue between the command line and the library: enum conversions, option
//! assembly and output path validation.

use std::path::Path;

use anyhow::{Result, anyhow};
use tracing::warn;

use crate::cli::{CliOptions, ResultFormat, StoreBackend};
use crate::config::{CheckOptions, Config};
use crate::output::OutputFormat;
use crate::store::StoreKind;

/// Convert CLI store backend to internal enum
pub fn store_kind_from_cli(backend: StoreBackend) -> StoreKind {
    match backend {
        StoreBackend::Jsonl => StoreKind::Jsonl,
        StoreBackend::Sqlite => StoreKind::Sqlite,
    }
}

/// Convert CLI result format to internal enum
pub fn format_from_cli(format: ResultFormat) -> OutputFormat {
    match format {
        ResultFormat::Text => OutputFormat::Text,
        ResultFormat::Jsonl => OutputFormat::Jsonl,
        ResultFormat::Csv => OutputFormat::Csv,
    }
}

/// Apply command-line overrides on top of the loaded config.
pub fn apply_cli_overrides(cfg: &mut Config, cli: &CliOptions) {
    if let Some(root) = &cli.root_id {
        cfg.root_id = root.clone();
    }
}

/// Build check options from the command line. With no check selected the
/// summary is enabled so a run always reports something.
pub fn options_from_cli(cli: &CliOptions) -> CheckOptions {
    let mut opts = CheckOptions {
        summary: cli.summary,
        progress: cli.progress,
        eta: cli.eta,
        orphan: cli.orphan,
        workers: cli.workers,
        output: cli.output.clone(),
        format: format_from_cli(cli.format),
        silent: cli.silent,
    };
    if !opts.any_check() {
        warn!("no checks selected; enabling --summary");
        opts.summary = true;
    }
    if opts.silent && opts.output.is_none() {
        warn!("--silent without --output: results will not be rendered anywhere");
    }
    opts
}

/// Ensure the result file can be created: its directory must exist and the
/// path must not be a directory.
pub fn ensure_output_path(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Err(anyhow!("output path is a directory: {}", path.display()));
    }
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => return Ok(()),
    };
    if !parent.is_dir() {
        return Err(anyhow!(
            "output directory does not exist: {}",
            parent.display()
        ));
    }
    let metadata = std::fs::metadata(parent)?;
    if metadata.permissions().readonly() {
        return Err(anyhow!(
            "output directory is not writable: {}",
            parent.display()
        ));
    }
    Ok(())
}

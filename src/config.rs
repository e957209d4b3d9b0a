use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::constants::{
    DEFAULT_ORPHAN_QUEUE_CAPACITY, DEFAULT_PROGRESS_EVERY_DOCS, DEFAULT_PROGRESS_INTERVAL_SECS,
    DEFAULT_QUEUE_CAPACITY, DEFAULT_ROOT_ID, DEFAULT_SCAN_BATCH_SIZE,
};
use crate::output::OutputFormat;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub run_id: String,
    pub root_id: String,
    pub queue_capacity: usize,
    pub progress_every_docs: u64,
    pub progress_interval_secs: u64,
    pub scan_batch_size: usize,
    pub orphan_queue_capacity: usize,
    pub trust_children_flag: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            run_id: String::new(),
            root_id: DEFAULT_ROOT_ID.to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            progress_every_docs: DEFAULT_PROGRESS_EVERY_DOCS,
            progress_interval_secs: DEFAULT_PROGRESS_INTERVAL_SECS,
            scan_batch_size: DEFAULT_SCAN_BATCH_SIZE,
            orphan_queue_capacity: DEFAULT_ORPHAN_QUEUE_CAPACITY,
            trust_children_flag: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub config_hash: String,
}

pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig> {
    let bytes: Vec<u8> = if let Some(p) = path {
        std::fs::read(p)?
    } else {
        include_bytes!("../config/default.yml").to_vec()
    };

    let mut config: Config = serde_yaml::from_slice(&bytes)?;
    if config.run_id.trim().is_empty() {
        config.run_id = generate_run_id();
    }

    let config_hash = hash_bytes(&bytes);

    Ok(LoadedConfig { config, config_hash })
}

fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    hex::encode(digest)
}

fn generate_run_id() -> String {
    let now = chrono::Utc::now();
    format!("{}_{}", now.format("%Y%m%dT%H%M%SZ"), rand_suffix())
}

fn rand_suffix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    format!("{:08x}", nanos)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("--eta requires --progress")]
    EtaWithoutProgress,
    #[error("worker count must be positive")]
    NoWorkers,
}

/// Which checks run and where their results go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOptions {
    pub summary: bool,
    pub progress: bool,
    /// Project remaining time from the store's estimated count.
    pub eta: bool,
    pub orphan: bool,
    /// Worker threads for the orphan check.
    pub workers: usize,
    /// Result file, in addition to the console.
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    /// Suppress console rendering; file output is unaffected.
    pub silent: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            summary: false,
            progress: false,
            eta: false,
            orphan: false,
            workers: 1,
            output: None,
            format: OutputFormat::Text,
            silent: false,
        }
    }
}

impl CheckOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.eta && !self.progress {
            return Err(ConfigError::EtaWithoutProgress);
        }
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        Ok(())
    }

    pub fn any_check(&self) -> bool {
        self.summary || self.progress || self.orphan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_loads_and_gets_run_id() {
        let loaded = load_config(None).expect("config");
        assert_eq!(loaded.config.root_id, "0:/");
        assert_eq!(loaded.config.queue_capacity, 1000);
        assert!(!loaded.config.run_id.is_empty());
        assert_eq!(loaded.config_hash.len(), 64);
    }

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("check.yml");
        std::fs::write(&path, "run_id: nightly\nqueue_capacity: 10\n").expect("write");
        let loaded = load_config(Some(&path)).expect("config");
        assert_eq!(loaded.config.run_id, "nightly");
        assert_eq!(loaded.config.queue_capacity, 10);
        assert_eq!(loaded.config.scan_batch_size, DEFAULT_SCAN_BATCH_SIZE);
    }

    #[test]
    fn eta_requires_progress() {
        let opts = CheckOptions {
            eta: true,
            ..CheckOptions::default()
        };
        assert_eq!(opts.validate(), Err(ConfigError::EtaWithoutProgress));
        let opts = CheckOptions {
            eta: true,
            progress: true,
            ..CheckOptions::default()
        };
        assert_eq!(opts.validate(), Ok(()));
    }

    #[test]
    fn zero_workers_rejected() {
        let opts = CheckOptions {
            workers: 0,
            ..CheckOptions::default()
        };
        assert_eq!(opts.validate(), Err(ConfigError::NoWorkers));
    }
}

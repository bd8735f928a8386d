//! Pipeline settings: executor limits, retry profiles and hand-off file paths.
//!
//! Loaded from an optional YAML file; every section has defaults, so an empty
//! file (or no file) gives the stock behavior.
//!
//! ```yaml
//! executor:
//!   max_concurrent: 5
//!   requests_per_second: 4
//! completion_retry:
//!   max_retries: 1
//!   initial_delay_ms: 300
//!   max_delay_ms: 5000
//!   backoff_factor: 2.0
//!   request_timeout_secs: 20
//! paths:
//!   results: results.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use runclose_client::{ExecutorConfig, RetryPolicy};
use serde::{Deserialize, Serialize};

/// Default settings file name, looked up in the working directory.
pub const SETTINGS_FILE_NAME: &str = "runclose.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub executor: ExecutorConfig,
    /// Profile for run lookups, listings and result ingestion.
    pub retry: RetryPolicy,
    /// Profile for completion calls.
    pub completion_retry: RetryPolicy,
    pub paths: PipelinePaths,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            executor: ExecutorConfig::default(),
            retry: RetryPolicy::standard(),
            completion_retry: RetryPolicy::conservative(),
            paths: PipelinePaths::default(),
        }
    }
}

impl Settings {
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).context("invalid settings")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("in {}", path.display()))
    }

    /// Load `path` when it exists, otherwise defaults.
    pub fn load_optional(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Hand-off files between stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelinePaths {
    /// NDJSON result log.
    pub results: PathBuf,
    /// Selected run IDs.
    pub selected: PathBuf,
    /// Confirmed run IDs.
    pub confirmed: PathBuf,
    /// Error ledger.
    pub ledger: PathBuf,
}

impl Default for PipelinePaths {
    fn default() -> Self {
        Self {
            results: PathBuf::from("results.json"),
            selected: PathBuf::from("filtered.txt"),
            confirmed: PathBuf::from("final.txt"),
            ledger: PathBuf::from("errors.txt"),
        }
    }
}

impl PipelinePaths {
    /// Resolve relative paths against `dir`; absolute paths stay as they are.
    pub fn resolve(&self, dir: &Path) -> Self {
        Self {
            results: dir.join(&self.results),
            selected: dir.join(&self.selected),
            confirmed: dir.join(&self.confirmed),
            ledger: dir.join(&self.ledger),
        }
    }
}

//! Durable error ledger for runs that could not be completed.
//!
//! One line per failed run, appended; the file is never truncated, so entries
//! from earlier executions stay in place.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Append-only ledger file; writes are serialized.
#[derive(Debug)]
pub struct ErrorLedger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ErrorLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an entry for `run_id`.
    pub async fn record(&self, run_id: u64, reason: &str) -> std::io::Result<()> {
        let line = format_entry(run_id, reason, Utc::now());

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}

/// `<rfc3339> Run ID <id>: <reason>\n`, with the reason folded onto one line.
pub fn format_entry(run_id: u64, reason: &str, at: DateTime<Utc>) -> String {
    let reason: String = reason
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    format!(
        "{} Run ID {}: {}\n",
        at.to_rfc3339_opts(SecondsFormat::Secs, true),
        run_id,
        reason.trim()
    )
}

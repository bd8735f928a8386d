//! Run-ID list codec for the stage hand-off files.
//!
//! # Format
//!
//! A single line of comma-separated decimal integers with no brackets and no
//! whitespace between tokens:
//!
//! ```text
//! 101,204,305
//! ```
//!
//! A trailing newline is tolerated and an empty file is an empty list. Empty
//! tokens (`1,,2`), repeated IDs and anything that is not a plain decimal
//! number are errors.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;

/// Parse failure for a run-ID list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunIdListError {
    #[error("empty run ID at position {position}")]
    EmptyToken { position: usize },

    #[error("invalid run ID '{token}' at position {position}")]
    InvalidToken { position: usize, token: String },

    #[error("duplicate run ID {id} at position {position}")]
    DuplicateId { position: usize, id: u64 },
}

/// Ordered list of distinct run IDs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RunIdList(Vec<u64>);

impl RunIdList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort ascending and drop duplicates.
    pub fn from_unsorted(ids: impl IntoIterator<Item = u64>) -> Self {
        let mut ids: Vec<u64> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self(ids)
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, u64> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, run_id: u64) -> bool {
        self.0.contains(&run_id)
    }

    pub fn into_vec(self) -> Vec<u64> {
        self.0
    }

    /// Encode to the hand-off format.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Parse the hand-off format, keeping the order found in the input.
    ///
    /// A run ID may appear only once; completion is not idempotent remotely.
    pub fn parse(input: &str) -> Result<Self, RunIdListError> {
        let input = input.trim_end_matches(|c: char| c == '\n' || c == '\r');
        if input.is_empty() {
            return Ok(Self::new());
        }

        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for (position, token) in input.split(',').enumerate() {
            let id = parse_token(position, token)?;
            if !seen.insert(id) {
                return Err(RunIdListError::DuplicateId { position, id });
            }
            ids.push(id);
        }
        Ok(Self(ids))
    }

    /// Read a hand-off file.
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read run ID list {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("malformed run ID list {}", path.display()))
    }

    /// Write a hand-off file, replacing any previous content.
    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        std::fs::write(path, self.encode())
            .with_context(|| format!("failed to write run ID list {}", path.display()))
    }
}

fn parse_token(position: usize, token: &str) -> Result<u64, RunIdListError> {
    if token.is_empty() {
        return Err(RunIdListError::EmptyToken { position });
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RunIdListError::InvalidToken {
            position,
            token: token.to_string(),
        });
    }
    token.parse().map_err(|_| RunIdListError::InvalidToken {
        position,
        token: token.to_string(),
    })
}

impl fmt::Display for RunIdList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", id)?;
        }
        Ok(())
    }
}

impl FromStr for RunIdList {
    type Err = RunIdListError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl FromIterator<u64> for RunIdList {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        Self::from_unsorted(iter)
    }
}

impl<'a> IntoIterator for &'a RunIdList {
    type Item = &'a u64;
    type IntoIter = std::slice::Iter<'a, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

//! The append-only result log: NDJSON, one [`ResultRecord`] per line.
//!
//! Reading is lenient per line: a malformed line is reported and skipped, and
//! the rest of the log still loads. Only I/O failures abort a load.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::model::{group_by_case, ResultRecord};

/// Per-line failure while reading the log.
#[derive(Debug, thiserror::Error)]
pub enum LogLineError {
    #[error("failed to read result log: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid result record at line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Iterator over NDJSON result records.
///
/// Parses records lazily, yielding one `Result<ResultRecord, LogLineError>` per
/// line. Empty lines are skipped.
pub struct ResultRecords<R: BufRead> {
    reader: R,
    line_buffer: Vec<u8>,
    line_number: usize,
}

impl<R: BufRead> ResultRecords<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_buffer: Vec::new(),
            line_number: 0,
        }
    }

    /// Get current line number (1-indexed, for error messages).
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl<R: BufRead> Iterator for ResultRecords<R> {
    type Item = Result<ResultRecord, LogLineError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line_buffer.clear();

            // Bytes, not `read_line`: a line with invalid UTF-8 is a bad record,
            // not a failed read.
            match self.reader.read_until(b'\n', &mut self.line_buffer) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_number += 1;

                    let line = trim_ascii_whitespace(&self.line_buffer);
                    if line.is_empty() {
                        continue;
                    }

                    return Some(serde_json::from_slice::<ResultRecord>(line).map_err(|source| {
                        LogLineError::Parse {
                            line: self.line_number,
                            source,
                        }
                    }));
                }
                Err(e) => return Some(Err(LogLineError::Io(e))),
            }
        }
    }
}

fn trim_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

/// In-memory index of the result log, grouped by run.
///
/// Read-only once loaded; stages share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct ResultLog {
    runs: BTreeMap<u64, Vec<ResultRecord>>,
    records: usize,
    skipped_lines: usize,
}

impl ResultLog {
    pub fn from_records(records: impl IntoIterator<Item = ResultRecord>) -> Self {
        let mut log = Self::default();
        for record in records {
            log.push(record);
        }
        log
    }

    /// Load from a file. A missing file is an error; malformed lines are skipped.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open result log {}", path.display()))?;
        let log = Self::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to read result log {}", path.display()))?;
        info!(
            path = %path.display(),
            runs = log.run_count(),
            records = log.record_count(),
            skipped = log.skipped_lines(),
            "loaded result log"
        );
        Ok(log)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, std::io::Error> {
        let mut log = Self::default();
        for item in ResultRecords::new(reader) {
            match item {
                Ok(record) => log.push(record),
                Err(LogLineError::Parse { line, source }) => {
                    warn!(line, error = %source, "skipping malformed result record");
                    log.skipped_lines += 1;
                }
                Err(LogLineError::Io(e)) => return Err(e),
            }
        }
        Ok(log)
    }

    fn push(&mut self, record: ResultRecord) {
        self.records += 1;
        self.runs.entry(record.run_id).or_default().push(record);
    }

    /// Records of one run, in log order.
    pub fn run(&self, run_id: u64) -> Option<&[ResultRecord]> {
        self.runs.get(&run_id).map(Vec::as_slice)
    }

    /// Runs in ascending ID order.
    pub fn runs(&self) -> impl Iterator<Item = (u64, &[ResultRecord])> + '_ {
        self.runs.iter().map(|(id, records)| (*id, records.as_slice()))
    }

    /// Records of one run grouped by case; empty when the run is unknown.
    pub fn cases(&self, run_id: u64) -> BTreeMap<u64, Vec<&ResultRecord>> {
        self.run(run_id).map(group_by_case).unwrap_or_default()
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    pub fn record_count(&self) -> usize {
        self.records
    }

    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }
}

/// Append opaque result objects to the log, one JSON line each.
///
/// Opens in append mode; existing lines are never rewritten.
pub async fn append_entities(path: &Path, entities: &[serde_json::Value]) -> Result<usize> {
    if entities.is_empty() {
        return Ok(0);
    }

    let mut buf = Vec::with_capacity(entities.len() * 256);
    for entity in entities {
        serde_json::to_writer(&mut buf, entity).context("failed to encode result record")?;
        buf.push(b'\n');
    }

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("failed to open result log {}", path.display()))?;
    file.write_all(&buf)
        .await
        .with_context(|| format!("failed to append to result log {}", path.display()))?;
    file.flush().await?;

    Ok(entities.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResultStatus;
    use std::io::Cursor;

    #[test]
    fn test_malformed_lines_are_skipped() {
        let input = concat!(
            r#"{"run_id":1,"case_id":1,"status":"passed","end_time":"2024-01-01T00:00:00"}"#,
            "\n",
            "not json\n",
            "\n",
            r#"{"run_id":1,"case_id":"two","status":"passed"}"#,
            "\n",
            r#"{"run_id":2,"case_id":5,"status":"failed","end_time":"2024-01-01T00:00:01"}"#,
            "\n",
        );
        let log = ResultLog::from_reader(Cursor::new(input)).unwrap();

        assert_eq!(log.record_count(), 2);
        assert_eq!(log.skipped_lines(), 2);
        assert_eq!(log.run_count(), 2);
        assert_eq!(log.run(2).unwrap()[0].status, ResultStatus::Other);
    }

    #[test]
    fn test_invalid_utf8_line_is_skipped() {
        let mut input = Vec::new();
        input.extend_from_slice(
            br#"{"run_id":1,"case_id":1,"status":"passed","end_time":"2024-01-01T00:00:00"}"#,
        );
        input.extend_from_slice(b"\n\xff\xfe garbage\n");
        input.extend_from_slice(
            br#"{"run_id":1,"case_id":2,"status":"passed","end_time":"2024-01-01T00:00:01"}"#,
        );
        input.extend_from_slice(b"\n");

        let log = ResultLog::from_reader(Cursor::new(input)).unwrap();

        assert_eq!(log.record_count(), 2);
        assert_eq!(log.skipped_lines(), 1);
        assert_eq!(log.cases(1).len(), 2);
    }

    #[test]
    fn test_invalid_utf8_inside_string_is_a_parse_error() {
        let input = b"{\"run_id\":1,\"case_id\":1,\"status\":\"pa\xffssed\"}\n".to_vec();
        let mut records = ResultRecords::new(Cursor::new(input));
        assert!(matches!(
            records.next(),
            Some(Err(LogLineError::Parse { line: 1, .. }))
        ));
        assert!(records.next().is_none());
    }

    #[test]
    fn test_crlf_line_endings() {
        let input = "{\"run_id\":3,\"case_id\":1,\"status\":\"passed\",\"end_time\":\"t\"}\r\n";
        let log = ResultLog::from_reader(Cursor::new(input)).unwrap();
        assert_eq!(log.record_count(), 1);
        assert_eq!(log.skipped_lines(), 0);
    }

    #[test]
    fn test_parse_error_reports_line_number() {
        let input = "\n{\"run_id\":1}\n";
        let mut records = ResultRecords::new(Cursor::new(input));
        match records.next() {
            Some(Err(LogLineError::Parse { line, .. })) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {other:?}"),
        }
        assert!(records.next().is_none());
    }

    #[test]
    fn test_runs_iterate_in_ascending_order() {
        let log = ResultLog::from_records([
            ResultRecord::new(30, 1, ResultStatus::Passed, "t"),
            ResultRecord::new(10, 1, ResultStatus::Passed, "t"),
            ResultRecord::new(20, 1, ResultStatus::Passed, "t"),
        ]);
        let ids: Vec<u64> = log.runs().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
        assert!(log.cases(99).is_empty());
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ResultLog::load(&dir.path().join("absent.json")).is_err());
    }

    #[tokio::test]
    async fn test_append_entities_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");

        let first = vec![serde_json::json!({"run_id": 1, "case_id": 1, "status": "passed", "end_time": "a"})];
        let second = vec![serde_json::json!({"run_id": 1, "case_id": 2, "status": "failed", "end_time": "b"})];
        assert_eq!(append_entities(&path, &first).await.unwrap(), 1);
        assert_eq!(append_entities(&path, &second).await.unwrap(), 1);
        assert_eq!(append_entities(&path, &[]).await.unwrap(), 0);

        let log = ResultLog::load(&path).unwrap();
        assert_eq!(log.record_count(), 2);
        assert_eq!(log.cases(1).len(), 2);
    }
}

//! Result records and the per-case outcome derived from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

/// Outcome of one case execution. Anything other than `"passed"` collapses to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum ResultStatus {
    Passed,
    Other,
}

impl From<String> for ResultStatus {
    fn from(value: String) -> Self {
        if value == "passed" {
            Self::Passed
        } else {
            Self::Other
        }
    }
}

impl ResultStatus {
    pub fn is_passed(self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// One line of the result log.
///
/// Extra payload fields (attachments, stacktrace, hash, ...) are ignored.
/// `end_time` compares as a string; producers must emit one fixed-width
/// ISO-8601 format for the ordering to hold.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResultRecord {
    pub run_id: u64,
    pub case_id: u64,
    pub status: ResultStatus,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub end_time: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl ResultRecord {
    pub fn new(run_id: u64, case_id: u64, status: ResultStatus, end_time: impl Into<String>) -> Self {
        Self {
            run_id,
            case_id,
            status,
            end_time: end_time.into(),
        }
    }

    pub fn is_passed(&self) -> bool {
        self.status.is_passed()
    }
}

/// Latest-result view of one `(run, case)` pair.
///
/// Among records sharing the latest end time a passing record wins, so the
/// outcome does not depend on log order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseOutcome<'a> {
    pub has_pass: bool,
    pub latest_pass_time: Option<&'a str>,
    pub latest_overall_time: &'a str,
    pub latest_overall_status: ResultStatus,
    pub record_count: usize,
}

impl<'a> CaseOutcome<'a> {
    /// Fold a case's records; `None` for an empty slice.
    pub fn from_records<I>(records: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a ResultRecord>,
    {
        let mut iter = records.into_iter();
        let first = iter.next()?;

        let mut outcome = Self {
            has_pass: first.is_passed(),
            latest_pass_time: first.is_passed().then_some(first.end_time.as_str()),
            latest_overall_time: &first.end_time,
            latest_overall_status: first.status,
            record_count: 1,
        };

        for record in iter {
            outcome.record_count += 1;
            let time = record.end_time.as_str();

            if time > outcome.latest_overall_time
                || (time == outcome.latest_overall_time && record.is_passed())
            {
                outcome.latest_overall_time = time;
                outcome.latest_overall_status = record.status;
            }

            if record.is_passed() {
                outcome.has_pass = true;
                if outcome.latest_pass_time.map_or(true, |t| time > t) {
                    outcome.latest_pass_time = Some(time);
                }
            }
        }

        Some(outcome)
    }

    /// The chronologically latest record is a passing one.
    pub fn latest_is_passing(&self) -> bool {
        self.latest_overall_status.is_passed()
            && self.latest_pass_time == Some(self.latest_overall_time)
    }
}

/// Partition one run's records by case, ordered by case ID.
pub fn group_by_case(records: &[ResultRecord]) -> BTreeMap<u64, Vec<&ResultRecord>> {
    let mut cases: BTreeMap<u64, Vec<&ResultRecord>> = BTreeMap::new();
    for record in records {
        cases.entry(record.case_id).or_default().push(record);
    }
    cases
}

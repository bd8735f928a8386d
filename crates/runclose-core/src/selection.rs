//! Run selection: decide from the result log alone which runs may go on to validation.
//!
//! A run is selected when every record passed, or when every case has at least
//! one pass and its latest record is a pass. One case that fails either check
//! rejects the whole run.

use tracing::{debug, info};

use crate::model::{group_by_case, CaseOutcome, ResultRecord};
use crate::result_log::ResultLog;
use crate::run_ids::RunIdList;

/// Why a run was or was not selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionDecision {
    /// Every record in the run passed.
    AllPassed,
    /// Some records failed, but every case's latest record passed.
    LatestPassing,
    /// This case never passed.
    NoPass { case_id: u64 },
    /// This case passed at some point, but a later record did not.
    Superseded { case_id: u64 },
}

impl SelectionDecision {
    pub fn is_selected(self) -> bool {
        matches!(self, Self::AllPassed | Self::LatestPassing)
    }
}

/// Evaluate one run's records.
pub fn evaluate_run(records: &[ResultRecord]) -> SelectionDecision {
    if records.iter().all(ResultRecord::is_passed) {
        return SelectionDecision::AllPassed;
    }

    for (case_id, case_records) in group_by_case(records) {
        let Some(outcome) = CaseOutcome::from_records(case_records.iter().copied()) else {
            continue;
        };

        if !outcome.has_pass {
            return SelectionDecision::NoPass { case_id };
        }
        if !outcome.latest_is_passing() {
            return SelectionDecision::Superseded { case_id };
        }
    }

    SelectionDecision::LatestPassing
}

/// Select eligible runs, ascending and deduplicated.
pub fn select_runs(log: &ResultLog) -> RunIdList {
    let mut selected = Vec::new();

    for (run_id, records) in log.runs() {
        let decision = evaluate_run(records);
        if decision.is_selected() {
            debug!(run_id, ?decision, "run selected");
            selected.push(run_id);
        } else {
            debug!(run_id, ?decision, "run rejected");
        }
    }

    let selected = RunIdList::from_unsorted(selected);
    info!(
        candidates = log.run_count(),
        selected = selected.len(),
        "selection finished"
    );
    selected
}

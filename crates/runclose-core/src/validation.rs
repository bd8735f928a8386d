//! Run validation: cross-check selected runs against the remote case list.
//!
//! Selection is not trusted here. Each run is re-checked from the local log
//! against what the service currently reports, since the remote side may have
//! moved on since selection.

use std::collections::BTreeMap;
use std::sync::Arc;

use runclose_client::{ApiError, RunDetail};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::context::PipelineContext;
use crate::model::CaseOutcome;
use crate::result_log::ResultLog;
use crate::run_ids::RunIdList;

/// Why a selected run was not confirmed. None of these are errors.
#[derive(Debug, thiserror::Error)]
pub enum Rejection {
    #[error("remote lookup failed: {0}")]
    Remote(#[from] ApiError),

    #[error("run is not in progress (status {status})")]
    NotInProgress { status: i64 },

    #[error("case {case_id}: remote expects {expected} results, log has {found}")]
    MissingResults {
        case_id: u64,
        expected: usize,
        found: usize,
    },

    #[error("case {case_id}: latest result is not a pass")]
    LatestNotPassing { case_id: u64 },
}

/// Check one run's local records against its authoritative case list.
pub fn check_run(log: &ResultLog, run: &RunDetail) -> Result<(), Rejection> {
    if !run.is_in_progress() {
        return Err(Rejection::NotInProgress { status: run.status });
    }

    let mut expected: BTreeMap<u64, usize> = BTreeMap::new();
    for case_id in &run.cases {
        *expected.entry(*case_id).or_default() += 1;
    }

    let local = log.cases(run.id);
    for (case_id, expected_count) in expected {
        let records = local.get(&case_id).map(Vec::as_slice).unwrap_or_default();
        if records.len() < expected_count {
            return Err(Rejection::MissingResults {
                case_id,
                expected: expected_count,
                found: records.len(),
            });
        }

        let latest_passing = CaseOutcome::from_records(records.iter().copied())
            .is_some_and(|outcome| outcome.latest_is_passing());
        if !latest_passing {
            return Err(Rejection::LatestNotPassing { case_id });
        }
    }

    Ok(())
}

/// Fetch and check one run.
pub async fn validate_run(
    ctx: &PipelineContext,
    log: &ResultLog,
    run_id: u64,
) -> Result<(), Rejection> {
    let api = ctx.api.clone();
    let mut run = ctx
        .executor
        .execute(&ctx.retry, || api.run_with_cases(run_id))
        .await?;
    // The check keys local records by the run we asked for.
    run.id = run_id;
    check_run(log, &run)
}

/// Validate every selected run concurrently; returns confirmed IDs ascending.
pub async fn validate_runs(
    ctx: &PipelineContext,
    log: Arc<ResultLog>,
    selected: &RunIdList,
) -> RunIdList {
    let mut join_set = JoinSet::new();

    for &run_id in selected {
        let ctx = ctx.clone();
        let log = log.clone();
        join_set.spawn(async move {
            let verdict = validate_run(&ctx, &log, run_id).await;
            (run_id, verdict)
        });
    }

    let mut confirmed = Vec::new();
    while let Some(res) = join_set.join_next().await {
        match res {
            Ok((run_id, Ok(()))) => {
                debug!(run_id, "run confirmed");
                confirmed.push(run_id);
            }
            Ok((run_id, Err(Rejection::Remote(e)))) => {
                warn!(run_id, error = %e, "run dropped: remote lookup failed");
            }
            Ok((run_id, Err(reason))) => {
                info!(run_id, %reason, "run not confirmed");
            }
            Err(e) => warn!(error = %e, "validation task failed"),
        }
    }

    let confirmed = RunIdList::from_unsorted(confirmed);
    info!(
        selected = selected.len(),
        confirmed = confirmed.len(),
        "validation finished"
    );
    confirmed
}

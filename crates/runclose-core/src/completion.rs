//! Completion: mark confirmed runs complete on the remote service.
//!
//! Completion is irreversible and the service does not deduplicate it, so
//! calls use the conservative retry profile. Failures are recorded in the
//! error ledger and never stop the rest of the batch.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::context::PipelineContext;
use crate::ledger::ErrorLedger;
use crate::run_ids::RunIdList;

/// Ledger reason for a run whose completion task died before reporting.
pub const LOST_TASK_REASON: &str = "completion task failed before reporting an outcome";

/// Result of one completion attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    Completed,
    Failed { reason: String },
}

/// Per-batch tally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionSummary {
    pub completed: RunIdList,
    pub failed: RunIdList,
}

impl CompletionSummary {
    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// True when nothing failed.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Complete a single run.
pub async fn complete_run(ctx: &PipelineContext, run_id: u64) -> CompletionOutcome {
    let api = ctx.api.clone();
    match ctx
        .executor
        .execute(&ctx.completion_retry, || api.complete_run(run_id))
        .await
    {
        Ok(ack) if ack.status => CompletionOutcome::Completed,
        Ok(ack) => CompletionOutcome::Failed {
            reason: ack
                .error_message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "remote service returned status false".to_string()),
        },
        Err(e) => CompletionOutcome::Failed {
            reason: e.to_string(),
        },
    }
}

/// Complete every run concurrently, recording failures in `ledger`.
pub async fn complete_runs(
    ctx: &PipelineContext,
    runs: &RunIdList,
    ledger: Arc<ErrorLedger>,
) -> CompletionSummary {
    let mut join_set = JoinSet::new();
    // Runs whose task has not reported back yet.
    let mut pending = BTreeSet::new();

    for &run_id in runs {
        if !pending.insert(run_id) {
            warn!(run_id, "duplicate run in completion batch, skipping");
            continue;
        }
        let ctx = ctx.clone();
        let ledger = ledger.clone();
        join_set.spawn(async move {
            let outcome = complete_run(&ctx, run_id).await;
            if let CompletionOutcome::Failed { reason } = &outcome {
                warn!(run_id, %reason, "failed to complete run");
                if let Err(e) = ledger.record(run_id, reason).await {
                    error!(
                        run_id,
                        ledger = %ledger.path().display(),
                        error = %e,
                        "failed to write error ledger"
                    );
                }
            } else {
                info!(run_id, "run marked complete");
            }
            (run_id, outcome)
        });
    }

    let mut completed = Vec::new();
    let mut failed = Vec::new();
    while let Some(res) = join_set.join_next().await {
        match res {
            Ok((run_id, outcome)) => {
                pending.remove(&run_id);
                match outcome {
                    CompletionOutcome::Completed => completed.push(run_id),
                    CompletionOutcome::Failed { .. } => failed.push(run_id),
                }
            }
            Err(e) => error!(error = %e, "completion task failed"),
        }
    }

    // Still pending: the task died before reporting. Counted as failed.
    for run_id in pending {
        warn!(run_id, "no completion outcome, recording as failed");
        if let Err(e) = ledger.record(run_id, LOST_TASK_REASON).await {
            error!(
                run_id,
                ledger = %ledger.path().display(),
                error = %e,
                "failed to write error ledger"
            );
        }
        failed.push(run_id);
    }

    let summary = CompletionSummary {
        completed: RunIdList::from_unsorted(completed),
        failed: RunIdList::from_unsorted(failed),
    };
    info!(
        completed = summary.completed_count(),
        failed = summary.failed_count(),
        "completion finished"
    );
    summary
}

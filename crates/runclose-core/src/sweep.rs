//! Sweep: complete every run the service still reports as in progress,
//! without consulting the result log.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::completion::{complete_runs, CompletionSummary};
use crate::context::PipelineContext;
use crate::ledger::ErrorLedger;
use crate::run_ids::RunIdList;

/// Runs per listing page.
pub const PAGE_LIMIT: u32 = 100;

/// Give up after this many failed pages in a row.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// Page through the run listing and collect in-progress run IDs.
///
/// A failed page is skipped (the offset still advances). Listing stops at the
/// first short page or after [`MAX_CONSECUTIVE_FAILURES`] failures in a row.
pub async fn find_in_progress_runs(ctx: &PipelineContext) -> RunIdList {
    let mut in_progress = Vec::new();
    let mut offset: u64 = 0;
    let mut consecutive_failures = 0;

    loop {
        let api = ctx.api.clone();
        match ctx
            .executor
            .execute(&ctx.retry, || api.list_runs(PAGE_LIMIT, offset))
            .await
        {
            Ok(page) => {
                consecutive_failures = 0;
                let before = in_progress.len();
                in_progress.extend(
                    page.entities
                        .iter()
                        .filter(|run| run.is_in_progress())
                        .map(|run| run.id),
                );
                debug!(
                    offset,
                    fetched = page.entities.len(),
                    in_progress = in_progress.len() - before,
                    "listed runs"
                );

                if page.entities.len() < PAGE_LIMIT as usize {
                    break;
                }
            }
            Err(e) => {
                consecutive_failures += 1;
                warn!(
                    offset,
                    error = %e,
                    consecutive_failures,
                    "failed to list runs, skipping page"
                );
                if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                    warn!("too many consecutive failures, stopping run listing");
                    break;
                }
            }
        }
        offset += u64::from(PAGE_LIMIT);
    }

    let runs = RunIdList::from_unsorted(in_progress);
    info!(in_progress = runs.len(), "run listing finished");
    runs
}

/// Find and complete every in-progress run.
pub async fn complete_all_in_progress(
    ctx: &PipelineContext,
    ledger: Arc<ErrorLedger>,
) -> CompletionSummary {
    let runs = find_in_progress_runs(ctx).await;
    if runs.is_empty() {
        info!("no in-progress runs found");
        return CompletionSummary::default();
    }
    complete_runs(ctx, &runs, ledger).await
}

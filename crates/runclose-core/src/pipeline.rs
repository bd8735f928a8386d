//! Stage wiring: select → validate → complete over the hand-off files.
//!
//! Each stage can run on its own (reading the previous stage's file) or as
//! part of [`run_pipeline`], which passes results along in memory and still
//! writes every hand-off file.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::completion::{complete_runs, CompletionSummary};
use crate::context::PipelineContext;
use crate::ingest::{ingest_results, IngestSummary};
use crate::ledger::ErrorLedger;
use crate::result_log::ResultLog;
use crate::run_ids::RunIdList;
use crate::selection::select_runs;
use crate::settings::PipelinePaths;
use crate::validation::validate_runs;

/// What a full pipeline execution did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// `None` when fetching was skipped.
    pub ingest: Option<IngestSummary>,
    pub selected: RunIdList,
    pub confirmed: RunIdList,
    pub completion: CompletionSummary,
}

/// Load the log, select runs, write the selected list.
pub fn select_stage(paths: &PipelinePaths) -> Result<(Arc<ResultLog>, RunIdList)> {
    let log = Arc::new(ResultLog::load(&paths.results)?);
    let selected = select_runs(&log);
    selected.write(&paths.selected)?;
    info!(
        path = %paths.selected.display(),
        selected = selected.len(),
        "wrote selected runs"
    );
    Ok((log, selected))
}

/// Validate the selected runs from the hand-off file, write the confirmed list.
pub async fn validate_stage(ctx: &PipelineContext, paths: &PipelinePaths) -> Result<RunIdList> {
    let log = Arc::new(ResultLog::load(&paths.results)?);
    let selected = RunIdList::read(&paths.selected)?;
    validate_and_write(ctx, log, &selected, paths).await
}

async fn validate_and_write(
    ctx: &PipelineContext,
    log: Arc<ResultLog>,
    selected: &RunIdList,
    paths: &PipelinePaths,
) -> Result<RunIdList> {
    let confirmed = validate_runs(ctx, log, selected).await;
    confirmed.write(&paths.confirmed)?;
    info!(
        path = %paths.confirmed.display(),
        confirmed = confirmed.len(),
        "wrote confirmed runs"
    );
    Ok(confirmed)
}

/// Complete the runs listed in the confirmed hand-off file.
pub async fn complete_stage(
    ctx: &PipelineContext,
    paths: &PipelinePaths,
) -> Result<CompletionSummary> {
    let confirmed = RunIdList::read(&paths.confirmed)?;
    let ledger = Arc::new(ErrorLedger::new(&paths.ledger));
    Ok(complete_runs(ctx, &confirmed, ledger).await)
}

/// Full pipeline. With `fetch`, results are ingested first; a failed fetch is
/// logged and the stages continue on whatever the log already holds.
pub async fn run_pipeline(
    ctx: &PipelineContext,
    paths: &PipelinePaths,
    fetch: bool,
) -> Result<PipelineReport> {
    let ingest = if fetch {
        match ingest_results(ctx, &paths.results).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "result fetch failed, continuing with existing log");
                None
            }
        }
    } else {
        None
    };

    let (log, selected) = select_stage(paths)?;
    let confirmed = validate_and_write(ctx, log, &selected, paths).await?;
    let ledger = Arc::new(ErrorLedger::new(&paths.ledger));
    let completion = complete_runs(ctx, &confirmed, ledger).await;

    Ok(PipelineReport {
        ingest,
        selected,
        confirmed,
        completion,
    })
}

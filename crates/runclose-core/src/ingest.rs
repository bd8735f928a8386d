//! Result ingestion: page through the remote result listing and append every
//! result to the local log.
//!
//! A probe request reads the total, then all pages are fetched concurrently
//! through the executor. Pages are appended as they arrive by this task alone,
//! so lines from different pages never interleave. A failed page is skipped.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::context::PipelineContext;
use crate::result_log::append_entities;

/// Results per page.
pub const PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub total: u64,
    pub pages_ok: usize,
    pub pages_failed: usize,
    pub records_written: usize,
}

fn page_offsets(total: u64) -> impl Iterator<Item = u64> {
    (0..total).step_by(PAGE_LIMIT as usize)
}

/// Fetch every remote result and append it to `log_path`.
///
/// Fails only when the total cannot be determined or the log cannot be written.
pub async fn ingest_results(ctx: &PipelineContext, log_path: &Path) -> Result<IngestSummary> {
    let api = ctx.api.clone();
    let probe = ctx
        .executor
        .execute(&ctx.retry, || api.list_results(1, 0))
        .await
        .context("failed to read result total")?;

    let mut summary = IngestSummary {
        total: probe.total,
        ..IngestSummary::default()
    };
    info!(total = summary.total, "fetching results");

    let mut join_set = JoinSet::new();
    for offset in page_offsets(summary.total) {
        let ctx = ctx.clone();
        join_set.spawn(async move {
            let api = ctx.api.clone();
            let page = ctx
                .executor
                .execute(&ctx.retry, || api.list_results(PAGE_LIMIT, offset))
                .await;
            (offset, page)
        });
    }

    while let Some(res) = join_set.join_next().await {
        match res {
            Ok((_, Ok(page))) => {
                summary.records_written += append_entities(log_path, &page.entities).await?;
                summary.pages_ok += 1;
            }
            Ok((offset, Err(e))) => {
                warn!(offset, error = %e, "skipping result page");
                summary.pages_failed += 1;
            }
            Err(e) => {
                warn!(error = %e, "result page task failed");
                summary.pages_failed += 1;
            }
        }
    }

    info!(
        path = %log_path.display(),
        records = summary.records_written,
        pages_failed = summary.pages_failed,
        "fetching complete"
    );
    Ok(summary)
}

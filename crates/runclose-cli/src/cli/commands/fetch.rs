use anyhow::Result;
use runclose_core::{ingest_results, PipelineContext, PipelinePaths};

use crate::exit_codes::SUCCESS;

pub async fn run(ctx: PipelineContext, paths: &PipelinePaths) -> Result<i32> {
    let summary = ingest_results(&ctx, &paths.results).await?;
    println!(
        "fetched {} of {} result(s) into {} ({} page(s) failed)",
        summary.records_written,
        summary.total,
        paths.results.display(),
        summary.pages_failed
    );
    Ok(SUCCESS)
}

use anyhow::Result;
use runclose_core::{run_pipeline, PipelineContext, PipelinePaths};

pub async fn run(ctx: PipelineContext, paths: &PipelinePaths, fetch: bool) -> Result<i32> {
    let report = run_pipeline(&ctx, paths, fetch).await?;

    if let Some(ingest) = &report.ingest {
        println!(
            "fetched {} result(s), {} page(s) failed",
            ingest.records_written, ingest.pages_failed
        );
    }
    println!(
        "selected {} run(s), confirmed {}",
        report.selected.len(),
        report.confirmed.len()
    );
    Ok(super::print_completion(&report.completion, paths))
}

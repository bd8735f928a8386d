use anyhow::Result;
use runclose_core::{complete_stage, PipelineContext, PipelinePaths};

pub async fn run(ctx: PipelineContext, paths: &PipelinePaths) -> Result<i32> {
    let summary = complete_stage(&ctx, paths).await?;
    Ok(super::print_completion(&summary, paths))
}

use anyhow::Result;
use runclose_core::{validate_stage, PipelineContext, PipelinePaths};

use crate::exit_codes::SUCCESS;

pub async fn run(ctx: PipelineContext, paths: &PipelinePaths) -> Result<i32> {
    let confirmed = validate_stage(&ctx, paths).await?;
    println!(
        "confirmed {} run(s) -> {}",
        confirmed.len(),
        paths.confirmed.display()
    );
    Ok(SUCCESS)
}

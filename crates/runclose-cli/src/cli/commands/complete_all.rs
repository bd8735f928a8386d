use std::sync::Arc;

use anyhow::Result;
use runclose_core::{complete_all_in_progress, ErrorLedger, PipelineContext, PipelinePaths};

pub async fn run(ctx: PipelineContext, paths: &PipelinePaths) -> Result<i32> {
    let ledger = Arc::new(ErrorLedger::new(&paths.ledger));
    let summary = complete_all_in_progress(&ctx, ledger).await;
    Ok(super::print_completion(&summary, paths))
}

use anyhow::Result;
use runclose_core::{select_stage, PipelinePaths};

use crate::exit_codes::SUCCESS;

pub fn run(paths: &PipelinePaths) -> Result<i32> {
    let (log, selected) = select_stage(paths)?;
    println!(
        "selected {} of {} run(s) -> {}",
        selected.len(),
        log.run_count(),
        paths.selected.display()
    );
    Ok(SUCCESS)
}

use std::sync::Arc;

use anyhow::{Context, Result};
use runclose_client::{ClientConfig, TestOpsClient};
use runclose_core::{CompletionSummary, PipelineContext, PipelinePaths, Settings, SETTINGS_FILE_NAME};

use super::args::*;
use crate::exit_codes::{COMPLETION_FAILED, SUCCESS};

pub(crate) mod complete;
pub(crate) mod complete_all;
pub(crate) mod fetch;
pub(crate) mod run;
pub(crate) mod select;
pub(crate) mod validate;

pub async fn dispatch(cli: Cli) -> Result<i32> {
    let settings = load_settings(&cli.global)?;
    let paths = settings.paths.resolve(&cli.global.workdir);

    match cli.cmd {
        Command::Fetch(args) => fetch::run(connect(&args, settings)?, &paths).await,
        Command::Select => select::run(&paths),
        Command::Validate(args) => validate::run(connect(&args, settings)?, &paths).await,
        Command::Complete(args) => complete::run(connect(&args, settings)?, &paths).await,
        Command::CompleteAll(args) => {
            complete_all::run(connect(&args, settings)?, &paths).await
        }
        Command::Run(args) => {
            let fetch = !args.no_fetch;
            run::run(connect(&args.api, settings)?, &paths, fetch).await
        }
    }
}

fn load_settings(global: &GlobalArgs) -> Result<Settings> {
    match &global.config {
        Some(path) => Settings::load(path),
        None => Settings::load_optional(&global.workdir.join(SETTINGS_FILE_NAME)),
    }
}

/// Apply flag overrides, check credentials, and build the per-execution context.
///
/// Fails before any network call when the token or project code is missing.
fn connect(args: &ApiArgs, mut settings: Settings) -> Result<PipelineContext> {
    if let Some(n) = args.max_concurrent {
        settings.executor.max_concurrent = n;
    }
    if let Some(rps) = args.requests_per_second {
        settings.executor.requests_per_second = rps;
    }

    let config = client_config(args);
    let client = TestOpsClient::new(config).context("cannot connect to test-management API")?;
    Ok(PipelineContext::new(Arc::new(client), &settings))
}

fn client_config(args: &ApiArgs) -> ClientConfig {
    let mut config = ClientConfig::default();
    if let Some(token) = args.token.as_deref().filter(|t| !t.is_empty()) {
        config = config.with_token(token);
    }
    if let Some(project) = args.project.as_deref().filter(|p| !p.is_empty()) {
        config = config.with_project_code(project);
    }
    if let Some(url) = &args.api_url {
        config = config.with_url(url);
    }
    if let Some(secs) = args.api_timeout {
        config.timeout_secs = secs;
    }
    config
}

fn print_completion(summary: &CompletionSummary, paths: &PipelinePaths) -> i32 {
    println!(
        "completed {} run(s), {} failed",
        summary.completed_count(),
        summary.failed_count()
    );
    if summary.is_clean() {
        SUCCESS
    } else {
        println!("failures recorded in {}", paths.ledger.display());
        COMPLETION_FAILED
    }
}

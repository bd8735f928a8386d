//! Run reconciliation and completion pipeline.
//!
//! Decides from an append-only log of test results which remote test runs
//! are safe to mark complete, and completes them:
//!
//! 1. [`selection`]: log-only eligibility ("latest result wins")
//! 2. [`validation`]: cross-check against the remote case list
//! 3. [`completion`]: irreversible completion calls plus an error ledger
//!
//! All remote calls go through one shared
//! [`Executor`](runclose_client::Executor) held by the [`PipelineContext`].

pub mod completion;
pub mod context;
pub mod ingest;
pub mod ledger;
pub mod model;
pub mod pipeline;
pub mod result_log;
pub mod run_ids;
pub mod selection;
pub mod settings;
pub mod sweep;
pub mod validation;

pub use completion::{complete_run, complete_runs, CompletionOutcome, CompletionSummary};
pub use context::PipelineContext;
pub use ingest::{ingest_results, IngestSummary};
pub use ledger::ErrorLedger;
pub use model::{CaseOutcome, ResultRecord, ResultStatus};
pub use pipeline::{complete_stage, run_pipeline, select_stage, validate_stage, PipelineReport};
pub use result_log::ResultLog;
pub use run_ids::{RunIdList, RunIdListError};
pub use selection::{evaluate_run, select_runs, SelectionDecision};
pub use settings::{PipelinePaths, Settings, SETTINGS_FILE_NAME};
pub use sweep::{complete_all_in_progress, find_in_progress_runs};
pub use validation::{check_run, validate_run, validate_runs, Rejection};

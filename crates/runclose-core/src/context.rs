//! Per-execution context shared by the remote-calling stages.

use std::sync::Arc;

use runclose_client::{Executor, RetryPolicy, TestOpsApi};

use crate::settings::Settings;

/// API handle, shared executor and retry profiles for one pipeline execution.
///
/// Cloning is cheap; every clone shares the same executor, so the rate limit
/// and slot bound hold across all stages and tasks.
#[derive(Clone)]
pub struct PipelineContext {
    pub api: Arc<dyn TestOpsApi>,
    pub executor: Arc<Executor>,
    pub retry: RetryPolicy,
    pub completion_retry: RetryPolicy,
}

impl PipelineContext {
    pub fn new(api: Arc<dyn TestOpsApi>, settings: &Settings) -> Self {
        Self {
            api,
            executor: Arc::new(Executor::new(settings.executor)),
            retry: settings.retry,
            completion_retry: settings.completion_retry,
        }
    }
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("executor", &self.executor)
            .field("retry", &self.retry)
            .field("completion_retry", &self.completion_retry)
            .finish_non_exhaustive()
    }
}

//! In-memory TestOpsApi used by the stage tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use runclose_client::{
    ApiError, ApiResult, CompletionAck, ExecutorConfig, Page, RetryPolicy, RunDetail, RunSummary,
    TestOpsApi,
};
use runclose_core::{PipelineContext, Settings};

/// How the fake answers a completion call.
#[derive(Debug, Clone)]
pub enum CompletionReply {
    Ok,
    Refused(String),
    Status(u16),
    /// Answer with this status `n` times, then succeed.
    FlakyStatus(u16, usize),
    Panic,
}

#[derive(Default)]
pub struct FakeApi {
    pub run_details: HashMap<u64, RunDetail>,
    pub completion_replies: HashMap<u64, CompletionReply>,
    pub listing: Vec<RunSummary>,
    pub failing_listing_offsets: HashSet<u64>,
    pub results: Vec<serde_json::Value>,
    pub failing_result_offsets: HashSet<u64>,

    pub completion_calls: Mutex<Vec<u64>>,
    pub listing_calls: AtomicUsize,
    pub flaky_seen: Mutex<HashMap<u64, usize>>,
}

impl FakeApi {
    pub fn with_run(mut self, id: u64, status: i64, cases: &[u64]) -> Self {
        self.run_details.insert(
            id,
            RunDetail {
                id,
                status,
                cases: cases.to_vec(),
            },
        );
        self
    }

    pub fn with_completion(mut self, id: u64, reply: CompletionReply) -> Self {
        self.completion_replies.insert(id, reply);
        self
    }

    pub fn completion_calls_for(&self, id: u64) -> usize {
        self.completion_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|&&called| called == id)
            .count()
    }
}

#[async_trait]
impl TestOpsApi for FakeApi {
    async fn list_runs(&self, limit: u32, offset: u64) -> ApiResult<Page<RunSummary>> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_listing_offsets.contains(&offset) {
            return Err(ApiError::Http {
                status: 400,
                body: "bad page".into(),
            });
        }
        Ok(page_of(&self.listing, limit, offset))
    }

    async fn run_with_cases(&self, run_id: u64) -> ApiResult<RunDetail> {
        self.run_details
            .get(&run_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                resource: format!("run/{run_id}"),
            })
    }

    async fn complete_run(&self, run_id: u64) -> ApiResult<CompletionAck> {
        self.completion_calls.lock().unwrap().push(run_id);
        let reply = self
            .completion_replies
            .get(&run_id)
            .cloned()
            .unwrap_or(CompletionReply::Ok);

        match reply {
            CompletionReply::Ok => Ok(CompletionAck {
                status: true,
                error_message: None,
            }),
            CompletionReply::Refused(message) => Ok(CompletionAck {
                status: false,
                error_message: Some(message),
            }),
            CompletionReply::Panic => panic!("completion handler crashed for run {run_id}"),
            CompletionReply::Status(status) => {
                Err(ApiError::from_status(status, "complete", String::new()))
            }
            CompletionReply::FlakyStatus(status, times) => {
                let mut seen = self.flaky_seen.lock().unwrap();
                let count = seen.entry(run_id).or_default();
                *count += 1;
                if *count <= times {
                    Err(ApiError::from_status(status, "complete", String::new()))
                } else {
                    Ok(CompletionAck {
                        status: true,
                        error_message: None,
                    })
                }
            }
        }
    }

    async fn list_results(&self, limit: u32, offset: u64) -> ApiResult<Page<serde_json::Value>> {
        if self.failing_result_offsets.contains(&offset) {
            return Err(ApiError::Http {
                status: 404,
                body: String::new(),
            });
        }
        Ok(page_of(&self.results, limit, offset))
    }
}

fn page_of<T: Clone>(items: &[T], limit: u32, offset: u64) -> Page<T> {
    let start = (offset as usize).min(items.len());
    let end = (start + limit as usize).min(items.len());
    let entities = items[start..end].to_vec();
    Page {
        total: items.len() as u64,
        filtered: items.len() as u64,
        count: entities.len() as u64,
        entities,
    }
}

/// Retry profile with millisecond delays.
pub fn quick_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        initial_delay_ms: 5,
        max_delay_ms: 20,
        backoff_factor: 2.0,
        request_timeout_secs: 5,
    }
}

pub fn context(api: Arc<FakeApi>) -> PipelineContext {
    let settings = Settings {
        executor: ExecutorConfig {
            max_concurrent: 4,
            requests_per_second: 1000,
        },
        retry: quick_policy(3),
        completion_retry: quick_policy(2),
        ..Settings::default()
    };
    PipelineContext::new(api, &settings)
}

pub fn result_line(run_id: u64, case_id: u64, status: &str, end_time: &str) -> String {
    serde_json::json!({
        "attachments": [],
        "case_id": case_id,
        "comment": null,
        "end_time": end_time,
        "hash": format!("{run_id}-{case_id}-{end_time}"),
        "is_api_result": true,
        "run_id": run_id,
        "stacktrace": null,
        "status": status,
        "steps": null,
        "time_spent_ms": 10
    })
    .to_string()
}

//! Client for the test-management API.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::auth::TokenProvider;
use crate::error::{ApiError, ApiResult};
use crate::types::{ClientConfig, CompletionAck, Envelope, Page, RunDetail, RunSummary};

mod helpers;
mod http;

use helpers::into_result;
use http::HttpBackend;

const USER_AGENT_VALUE: &str = concat!("runclose/", env!("CARGO_PKG_VERSION"));

/// Remote operations the pipeline consumes.
///
/// Each method is a single attempt; wrap calls in
/// [`Executor::execute`](crate::Executor::execute) for pacing and retries.
#[async_trait]
pub trait TestOpsApi: Send + Sync {
    /// `GET run/{project}?limit&offset`
    async fn list_runs(&self, limit: u32, offset: u64) -> ApiResult<Page<RunSummary>>;

    /// `GET run/{project}/{id}?include=cases`
    async fn run_with_cases(&self, run_id: u64) -> ApiResult<RunDetail>;

    /// `POST run/{project}/{id}/complete`. Not idempotent on the service side.
    async fn complete_run(&self, run_id: u64) -> ApiResult<CompletionAck>;

    /// `GET result/{project}?limit&offset`; entities are opaque result objects.
    async fn list_results(&self, limit: u32, offset: u64) -> ApiResult<Page<serde_json::Value>>;
}

/// reqwest-backed implementation of [`TestOpsApi`].
#[derive(Debug, Clone)]
pub struct TestOpsClient {
    http: HttpBackend,
    project_code: String,
}

impl TestOpsClient {
    /// Build a client; fails before any network call if credentials are missing.
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        config.preflight()?;

        let token_provider = config
            .token
            .as_ref()
            .map(TokenProvider::static_token)
            .unwrap_or_else(TokenProvider::from_env);

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| ApiError::Config {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http: HttpBackend {
                client,
                base_url: config.url.trim_end_matches('/').to_string(),
                token_provider,
            },
            project_code: config.project_code.unwrap_or_default(),
        })
    }

    pub fn from_env() -> ApiResult<Self> {
        Self::new(ClientConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.http.base_url
    }

    pub fn project_code(&self) -> &str {
        &self.project_code
    }
}

#[async_trait]
impl TestOpsApi for TestOpsClient {
    async fn list_runs(&self, limit: u32, offset: u64) -> ApiResult<Page<RunSummary>> {
        let path = format!("run/{}", self.project_code);
        debug!(limit, offset, "listing runs");
        let envelope: Envelope<Page<RunSummary>> = self
            .http
            .get_json(
                &path,
                &[("limit", limit.to_string()), ("offset", offset.to_string())],
            )
            .await?;
        into_result(envelope, "run listing")
    }

    async fn run_with_cases(&self, run_id: u64) -> ApiResult<RunDetail> {
        let path = format!("run/{}/{}", self.project_code, run_id);
        debug!(run_id, "fetching run with cases");
        let envelope: Envelope<RunDetail> = self
            .http
            .get_json(&path, &[("include", "cases".to_string())])
            .await?;
        into_result(envelope, "run")
    }

    async fn complete_run(&self, run_id: u64) -> ApiResult<CompletionAck> {
        let path = format!("run/{}/{}/complete", self.project_code, run_id);
        debug!(run_id, "completing run");
        self.http.post_json(&path).await
    }

    async fn list_results(&self, limit: u32, offset: u64) -> ApiResult<Page<serde_json::Value>> {
        let path = format!("result/{}", self.project_code);
        debug!(limit, offset, "listing results");
        let envelope: Envelope<Page<serde_json::Value>> = self
            .http
            .get_json(
                &path,
                &[("limit", limit.to_string()), ("offset", offset.to_string())],
            )
            .await?;
        into_result(envelope, "result listing")
    }
}

//! Configuration and wire types for the test-management API.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// Remote run status meaning "in progress".
pub const RUN_STATUS_IN_PROGRESS: i64 = 0;

/// Client configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL for the API.
    #[serde(default = "default_api_url")]
    pub url: String,

    /// Authentication token.
    #[serde(default)]
    pub token: Option<String>,

    /// Project code, part of every request path.
    #[serde(default)]
    pub project_code: Option<String>,

    /// Transport-level request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("project_code", &self.project_code)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_api_url() -> String {
    "https://api.qase.io/v1".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            token: None,
            project_code: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `QASE_API_URL` | API base URL |
    /// | `QASE_API_TOKEN` | Authentication token |
    /// | `QASE_PROJECT_CODE` | Project code |
    /// | `QASE_API_TIMEOUT` | Request timeout in seconds |
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("QASE_API_URL").unwrap_or_else(|_| default_api_url()),
            token: std::env::var("QASE_API_TOKEN")
                .ok()
                .filter(|v| !v.is_empty()),
            project_code: std::env::var("QASE_PROJECT_CODE")
                .ok()
                .filter(|v| !v.is_empty()),
            timeout_secs: std::env::var("QASE_API_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout),
        }
    }

    /// Set the token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the base URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the project code.
    pub fn with_project_code(mut self, code: impl Into<String>) -> Self {
        self.project_code = Some(code.into());
        self
    }

    /// Fail fast before any network call when credentials are missing.
    pub fn preflight(&self) -> ApiResult<()> {
        if self.token.as_deref().map_or(true, str::is_empty) {
            return Err(ApiError::Config {
                message: "missing API token (set QASE_API_TOKEN)".to_string(),
            });
        }
        if self.project_code.as_deref().map_or(true, str::is_empty) {
            return Err(ApiError::Config {
                message: "missing project code (set QASE_PROJECT_CODE)".to_string(),
            });
        }
        url::Url::parse(&self.url).map_err(|e| ApiError::Config {
            message: format!("invalid API url '{}': {}", self.url, e),
        })?;
        Ok(())
    }
}

/// Bounded concurrency and global pacing for one executor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

fn default_max_concurrent() -> usize {
    5
}

fn default_requests_per_second() -> u32 {
    4
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

impl ExecutorConfig {
    /// Period between rate-limiter ticks.
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs(1) / self.requests_per_second.max(1)
    }
}

/// Retry profile passed to every `Executor::execute` call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_factor: f64,
    pub request_timeout_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl RetryPolicy {
    /// Profile for reads and other calls that are safe to repeat.
    pub const fn standard() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
            backoff_factor: 2.0,
            request_timeout_secs: 30,
        }
    }

    /// Profile for completion calls: a repeated completion may be seen as a duplicate.
    pub const fn conservative() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 300,
            max_delay_ms: 5_000,
            backoff_factor: 2.0,
            request_timeout_secs: 20,
        }
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Delay before the retry that follows attempt `attempt` (0-indexed):
    /// `min(initial_delay * backoff_factor^attempt, max_delay)`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let scaled = self.initial_delay_ms as f64 * self.backoff_factor.powi(exponent);
        let max = self.max_delay_ms as f64;
        let ms = if scaled.is_finite() { scaled.min(max) } else { max };
        Duration::from_millis(ms.max(0.0).round() as u64)
    }
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub status: bool,
    #[serde(default = "Option::default")]
    pub result: Option<T>,
    #[serde(default, rename = "errorMessage")]
    pub error_message: Option<String>,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub filtered: u64,
    #[serde(default)]
    pub count: u64,
    #[serde(default = "Vec::new")]
    pub entities: Vec<T>,
}

/// Run metadata from the run listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RunSummary {
    pub id: u64,
    pub status: i64,
}

impl RunSummary {
    pub fn is_in_progress(&self) -> bool {
        self.status == RUN_STATUS_IN_PROGRESS
    }
}

/// A run with its authoritative case list (`include=cases`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunDetail {
    pub id: u64,
    pub status: i64,
    #[serde(default)]
    pub cases: Vec<u64>,
}

impl RunDetail {
    pub fn is_in_progress(&self) -> bool {
        self.status == RUN_STATUS_IN_PROGRESS
    }
}

/// Body of the completion call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompletionAck {
    pub status: bool,
    #[serde(default, rename = "errorMessage")]
    pub error_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_then_caps() {
        let policy = RetryPolicy::standard();
        assert_eq!(policy.backoff_delay(0), Duration::from_millis(500));
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(1000));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(2000));
        assert_eq!(policy.backoff_delay(5), Duration::from_millis(10_000));
        assert_eq!(policy.backoff_delay(u32::MAX), Duration::from_millis(10_000));
    }

    #[test]
    fn test_conservative_is_stricter_than_standard() {
        let standard = RetryPolicy::standard();
        let conservative = RetryPolicy::conservative();
        assert!(conservative.max_retries < standard.max_retries);
        assert!(conservative.request_timeout() < standard.request_timeout());
    }

    #[test]
    fn test_tick_period() {
        let cfg = ExecutorConfig {
            max_concurrent: 1,
            requests_per_second: 4,
        };
        assert_eq!(cfg.tick_period(), Duration::from_millis(250));
        let zero = ExecutorConfig {
            max_concurrent: 1,
            requests_per_second: 0,
        };
        assert_eq!(zero.tick_period(), Duration::from_secs(1));
    }

    #[test]
    fn test_preflight_requires_token_and_project() {
        let cfg = ClientConfig::default();
        assert!(matches!(cfg.preflight(), Err(ApiError::Config { .. })));

        let cfg = ClientConfig::default().with_token("t");
        assert!(matches!(cfg.preflight(), Err(ApiError::Config { .. })));

        let cfg = ClientConfig::default()
            .with_token("t")
            .with_project_code("DEMO");
        assert!(cfg.preflight().is_ok());

        let cfg = cfg.with_url("not a url");
        assert!(matches!(cfg.preflight(), Err(ApiError::Config { .. })));
    }

    #[test]
    fn test_envelope_parses_run_detail() {
        let body = r#"{"status":true,"result":{"id":200,"status":0,"title":"nightly","cases":[5,5,6]}}"#;
        let env: Envelope<RunDetail> = serde_json::from_str(body).unwrap();
        let run = env.result.unwrap();
        assert!(run.is_in_progress());
        assert_eq!(run.cases, vec![5, 5, 6]);
    }

    #[test]
    fn test_completion_ack_error_message() {
        let ack: CompletionAck =
            serde_json::from_str(r#"{"status":false,"errorMessage":"Test run not found"}"#)
                .unwrap();
        assert!(!ack.status);
        assert_eq!(ack.error_message.as_deref(), Some("Test run not found"));
    }

    #[test]
    fn test_config_debug_redacts_token() {
        let cfg = ClientConfig::default().with_token("secret");
        assert!(!format!("{cfg:?}").contains("secret"));
    }
}

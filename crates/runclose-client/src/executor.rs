//! Rate-limited, bounded-concurrency call driver with exponential backoff.
//!
//! Every remote call in the pipeline goes through one [`Executor`]. A call holds
//! one concurrency slot for its whole lifetime (retries and backoff included)
//! and takes one rate-limiter tick before each attempt it dispatches.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::types::{ExecutorConfig, RetryPolicy};

/// Shared executor; construct once per pipeline execution and pass by reference.
#[derive(Debug)]
pub struct Executor {
    config: ExecutorConfig,
    slots: Arc<Semaphore>,
    /// Earliest instant the next tick may fire. `None` until the first call.
    next_tick: Mutex<Option<Instant>>,
}

impl Executor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
            next_tick: Mutex::new(None),
            config,
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run `call` under the rate ceiling and slot bound, retrying transient failures.
    ///
    /// Terminal errors come back as-is after the first attempt. When every attempt
    /// fails transiently the result is [`ApiError::RetriesExhausted`] wrapping the
    /// last failure.
    pub async fn execute<T, F, Fut>(&self, policy: &RetryPolicy, mut call: F) -> ApiResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        // Dropped on every exit path, unwinding included.
        let _slot = self
            .slots
            .acquire()
            .await
            .map_err(|_| ApiError::Config {
                message: "executor slot pool closed".to_string(),
            })?;

        let timeout = policy.request_timeout();
        let mut attempt: u32 = 0;

        loop {
            self.tick().await;

            let outcome = match tokio::time::timeout(timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(ApiError::Timeout {
                    message: format!("no response within {timeout:?}"),
                }),
            };

            match outcome {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(attempt = attempt + 1, "request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) if attempt >= policy.max_retries => {
                    return Err(ApiError::RetriesExhausted {
                        attempts: attempt + 1,
                        last: Box::new(e),
                    });
                }
                Err(e) => {
                    let backoff = policy.backoff_delay(attempt);
                    warn!(
                        error = %e,
                        attempt = attempt + 1,
                        max_attempts = policy.max_retries + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        "retrying request"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Wait for the next rate-limiter tick.
    ///
    /// Ticks are spaced one period apart. A tick nobody waited for is lost, so an
    /// idle stretch never buys a burst afterwards.
    async fn tick(&self) {
        let period = self.config.tick_period();
        let fire_at = {
            let mut next = match self.next_tick.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let now = Instant::now();
            let slot = match *next {
                Some(at) if at > now => at,
                _ => now,
            };
            *next = Some(slot + period);
            slot
        };
        tokio::time::sleep_until(fire_at).await;
    }
}

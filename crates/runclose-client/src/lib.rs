//! Test-management API client for run reconciliation.
//!
//! This crate provides:
//!
//! - HTTP client for the run, result and completion endpoints with token auth
//! - A shared [`Executor`] that paces calls, bounds concurrency and retries
//!   transient failures with exponential backoff
//! - Retry profiles ([`RetryPolicy::standard`], [`RetryPolicy::conservative`])
//!
//! # Quick Start
//!
//! ```no_run
//! use runclose_client::{ClientConfig, Executor, ExecutorConfig, RetryPolicy, TestOpsApi, TestOpsClient};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = TestOpsClient::new(ClientConfig::from_env())?;
//! let executor = Executor::new(ExecutorConfig::default());
//!
//! let run = executor
//!     .execute(&RetryPolicy::standard(), || client.run_with_cases(42))
//!     .await?;
//! println!("run {} has {} cases", run.id, run.cases.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `QASE_API_URL` | API base URL (default: `https://api.qase.io/v1`) |
//! | `QASE_API_TOKEN` | Authentication token (required) |
//! | `QASE_PROJECT_CODE` | Project code (required) |
//! | `QASE_API_TIMEOUT` | Transport timeout in seconds (default: 30) |

pub mod auth;
pub mod client;
pub mod error;
pub mod executor;
pub mod types;

pub use auth::TokenProvider;
pub use client::{TestOpsApi, TestOpsClient};
pub use error::{ApiError, ApiResult};
pub use executor::Executor;
pub use types::{
    ClientConfig, CompletionAck, Envelope, ExecutorConfig, Page, RetryPolicy, RunDetail,
    RunSummary, RUN_STATUS_IN_PROGRESS,
};

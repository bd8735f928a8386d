//! Error types for the test-management API client.

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport failure (connection refused, DNS, reset).
    #[error("network error: {message}")]
    Network { message: String },

    /// The request did not finish in time, either at the transport or
    /// within the executor's per-attempt budget.
    #[error("request timed out: {message}")]
    Timeout { message: String },

    /// Too many requests (429).
    #[error("rate limited by remote service")]
    RateLimited,

    /// Authentication failed or token invalid (401/403).
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// Run or project not found (404).
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// Any other non-success status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Body could not be decoded.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// The service answered 2xx but reported `status: false`.
    #[error("request rejected by remote service: {message}")]
    Rejected { message: String },

    /// Configuration error (missing credentials, bad URL).
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Retry budget spent; carries the last observed failure.
    #[error("request failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<ApiError> },
}

impl ApiError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            Self::Unauthorized { .. } => 2,
            _ => 1,
        }
    }

    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Timeout { .. } | Self::RateLimited => true,
            Self::Http { status, .. } => matches!(status, 500 | 502 | 503 | 504),
            _ => false,
        }
    }

    /// Map a non-success status code to an error.
    pub fn from_status(status: u16, resource: &str, body: String) -> Self {
        match status {
            401 | 403 => Self::Unauthorized {
                message: if body.is_empty() {
                    "invalid or expired token".to_string()
                } else {
                    body
                },
            },
            404 => Self::NotFound {
                resource: resource.to_string(),
            },
            429 => Self::RateLimited,
            _ => Self::Http { status, body },
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout {
                message: err.to_string(),
            };
        }
        if err.is_decode() {
            return Self::InvalidResponse {
                message: err.to_string(),
            };
        }
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

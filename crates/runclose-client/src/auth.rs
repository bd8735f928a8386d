//! Token authentication for the test-management API.
//!
//! The service expects the raw API token in a `Token` header on every request.

use reqwest::header::{HeaderName, HeaderValue};

use crate::error::{ApiError, ApiResult};

/// Header carrying the API token.
pub const TOKEN_HEADER: HeaderName = HeaderName::from_static("token");

/// Token provider for API authentication.
#[derive(Clone, Default)]
pub enum TokenProvider {
    /// Static token (from config or env).
    Static(String),

    /// No authentication.
    #[default]
    None,
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(_) => f.write_str("TokenProvider::Static(<redacted>)"),
            Self::None => f.write_str("TokenProvider::None"),
        }
    }
}

impl TokenProvider {
    /// Create a static token provider.
    pub fn static_token(token: impl Into<String>) -> Self {
        Self::Static(token.into())
    }

    /// Create from `QASE_API_TOKEN`; empty values count as unset.
    pub fn from_env() -> Self {
        match std::env::var("QASE_API_TOKEN") {
            Ok(token) if !token.is_empty() => Self::Static(token),
            _ => Self::None,
        }
    }

    /// Header value for the current token, if any.
    pub fn header_value(&self) -> ApiResult<Option<HeaderValue>> {
        match self {
            Self::Static(token) => {
                let mut value = HeaderValue::from_str(token).map_err(|_| ApiError::Config {
                    message: "API token contains characters not allowed in a header".to_string(),
                })?;
                value.set_sensitive(true);
                Ok(Some(value))
            }
            Self::None => Ok(None),
        }
    }

    /// Check if authentication is configured.
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::None)
    }
}

//! HTTP layer: request building, auth header, status mapping, body decoding.
//!
//! This is the ONLY place for status code handling. client/mod.rs never
//! interprets status codes. Retries live in the executor, so every call here
//! is a single attempt.

use reqwest::header::ACCEPT;
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::auth::{TokenProvider, TOKEN_HEADER};
use crate::error::{ApiError, ApiResult};

use super::helpers::truncate_body;

/// HTTP backend (holds reqwest client, auth, base URL).
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) token_provider: TokenProvider,
}

impl HttpBackend {
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        self.send_json(Method::GET, path, query).await
    }

    pub(crate) async fn post_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send_json(Method::POST, path, &[]).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(method = %method, url = %url, "sending request");

        let mut request = self
            .client
            .request(method, &url)
            .header(ACCEPT, "application/json");

        if let Some(token) = self.token_provider.header_value()? {
            request = request.header(TOKEN_HEADER, token);
        }

        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(
                status.as_u16(),
                path,
                truncate_body(&body),
            ));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::InvalidResponse {
            message: format!(
                "failed to parse {} response: {} (body: {})",
                path,
                e,
                truncate_body(&String::from_utf8_lossy(&bytes))
            ),
        })
    }
}

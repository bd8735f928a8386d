//! Pure helpers: envelope unwrapping and body truncation (no HTTP, no status logic).

use crate::error::{ApiError, ApiResult};
use crate::types::Envelope;

const MAX_BODY_CHARS: usize = 200;

/// Unwrap `{status, result}`; `status: false` is a rejection, a missing result is malformed.
pub(crate) fn into_result<T>(envelope: Envelope<T>, what: &str) -> ApiResult<T> {
    if !envelope.status {
        return Err(ApiError::Rejected {
            message: envelope
                .error_message
                .unwrap_or_else(|| format!("{} returned status false", what)),
        });
    }
    envelope.result.ok_or_else(|| ApiError::InvalidResponse {
        message: format!("{} response has no result", what),
    })
}

/// Keep error bodies short enough for a log line.
pub(crate) fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_BODY_CHARS {
        body.to_string()
    } else {
        let mut short: String = body.chars().take(MAX_BODY_CHARS).collect();
        short.push('…');
        short
    }
}

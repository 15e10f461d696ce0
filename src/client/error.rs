//! Errors returned by the SendGrid client.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::retry::{Classification, Classify};

/// Header carrying the epoch second at which the rate limit window resets.
pub const RATE_LIMIT_RESET_HEADER: &str = "X-RateLimit-Reset";

/// Standard HTTP hint, in seconds.
pub const RETRY_AFTER_HEADER: &str = "Retry-After";

/// Errors from calls to the SendGrid API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// SendGrid answered 429.
    #[error("rate limited by SendGrid{}", format_reset(.reset_after))]
    RateLimited {
        /// Time until the limit resets, from the response headers.
        reset_after: Option<Duration>,
    },

    /// SendGrid answered 404.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// Messages extracted from the error body.
        message: String,
    },

    /// The request never produced a response.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The client could not be built.
    #[error("invalid client configuration: {0}")]
    Config(String),
}

fn format_reset(reset_after: &Option<Duration>) -> String {
    match reset_after {
        Some(wait) => format!(" (resets in {}ms)", wait.as_millis()),
        None => String::new(),
    }
}

impl ApiError {
    /// The HTTP status behind this error, when there was a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited { .. } => Some(StatusCode::TOO_MANY_REQUESTS.as_u16()),
            Self::NotFound(_) => Some(StatusCode::NOT_FOUND.as_u16()),
            Self::Status { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            Self::Decode(_) | Self::Config(_) => None,
        }
    }

    /// Whether SendGrid reported the object as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Build the error for a non-success response.
    pub(crate) fn from_response(status: StatusCode, headers: &HeaderMap, body: &str) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited {
                reset_after: reset_after(headers, chrono::Utc::now().timestamp()),
            },
            StatusCode::NOT_FOUND => Self::NotFound(error_message(body)),
            _ => Self::Status {
                status: status.as_u16(),
                message: error_message(body),
            },
        }
    }
}

impl Classify for ApiError {
    fn classify(&self) -> Classification {
        match self {
            Self::RateLimited { reset_after } => Classification::RateLimited {
                reset_after: *reset_after,
            },
            _ => Classification::Fatal,
        }
    }
}

/// Work out how long to wait from rate-limit headers.
///
/// `X-RateLimit-Reset` is an epoch second and wins over `Retry-After`.
/// A reset time that is not in the future (clock skew, stale header) is
/// ignored, and so is a zero `Retry-After`.
pub(crate) fn reset_after(headers: &HeaderMap, now_epoch_secs: i64) -> Option<Duration> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
    };

    header(RATE_LIMIT_RESET_HEADER)
        .map(|reset_at| reset_at.saturating_sub(now_epoch_secs))
        .filter(|secs| *secs > 0)
        .or_else(|| header(RETRY_AFTER_HEADER).filter(|secs| *secs > 0))
        .map(|secs| Duration::from_secs(secs as u64))
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ErrorItem {
    #[serde(default)]
    field: Option<String>,
    #[serde(default)]
    message: String,
}

/// Extract human-readable messages from a SendGrid error body.
///
/// SendGrid answers `{"errors":[{"field":"name","message":"..."}]}`; anything
/// else is passed through verbatim.
fn error_message(body: &str) -> String {
    let parsed = match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed,
        _ if body.trim().is_empty() => return "<empty body>".to_string(),
        _ => return body.trim().to_string(),
    };

    parsed
        .errors
        .iter()
        .map(|item| match item.field.as_deref() {
            Some(field) if !field.is_empty() => format!("{}: {}", field, item.message),
            _ => item.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

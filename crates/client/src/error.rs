//! Client error model.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use quire_core::DomainError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// No response was received (connection refused, DNS, TLS, reset).
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    /// The API rejected the credential and recovery was exhausted or skipped.
    /// Callers should treat the user as logged out.
    #[error("unauthorized: {}", .message.as_deref().unwrap_or("authentication required"))]
    Unauthorized { message: Option<String> },

    #[error("API error ({status}): {}", .message.as_deref().unwrap_or("no details"))]
    Api { status: u16, message: Option<String> },

    #[error("failed to encode request body: {0}")]
    Encode(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }

    /// Consume a non-success response and classify it.
    pub(crate) async fn from_response(resp: reqwest::Response) -> Self {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|body| extract_message(&body))
            .or_else(|| {
                let trimmed = text.trim();
                (!trimmed.is_empty() && !trimmed.starts_with('<')).then(|| trimmed.to_string())
            });

        Self::from_status(status, message)
    }

    pub(crate) fn from_status(status: StatusCode, message: Option<String>) -> Self {
        if status == StatusCode::UNAUTHORIZED {
            Self::Unauthorized { message }
        } else {
            Self::Api {
                status: status.as_u16(),
                message,
            }
        }
    }

    /// Whether this is a credential failure (as opposed to a transient one).
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Whether no response was received at all.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED.as_u16()),
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// A message fit for display, falling back to `fallback` when the server
    /// gave no usable explanation.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Unauthorized { message } | Self::Api { message, .. } => {
                message.clone().unwrap_or_else(|| fallback.to_string())
            }
            Self::Validation(err) => err.message().to_string(),
            _ => fallback.to_string(),
        }
    }
}

/// Pick the most useful human-readable message out of an error body.
///
/// Order: a bare string body, `detail`, then the first `username` or
/// `password` field error.
pub fn extract_message(body: &Value) -> Option<String> {
    if let Some(s) = body.as_str() {
        return non_blank(s);
    }

    let obj = body.as_object()?;
    if let Some(detail) = obj.get("detail").and_then(Value::as_str).and_then(non_blank) {
        return Some(detail);
    }

    ["username", "password"]
        .iter()
        .find_map(|field| obj.get(*field).and_then(first_message))
}

fn first_message(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_blank(s),
        Value::Array(items) => items.first().and_then(Value::as_str).and_then(non_blank),
        _ => None,
    }
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

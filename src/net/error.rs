//! Remote API error taxonomy.
//!
//! Every failed call is classified once, at the HTTP boundary, so state
//! modules can branch on kind (implicit logout on 401, silent degrade on
//! network failure, verbatim backend message on validation failure).

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use crate::storage::StorageError;

/// Errors produced by [`RemoteApi`](super::api::RemoteApi) calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout).
    #[error("network failure: {0}")]
    Network(String),

    /// 401/403: the credential is missing, expired, or rejected.
    #[error("authorization denied: {message}")]
    Unauthorized { status: u16, message: String },

    /// Any other 4xx, usually carrying a backend validation message.
    #[error("request rejected ({status}): {message}")]
    Validation { status: u16, message: String },

    /// 5xx from the backend.
    #[error("server failure ({status}): {message}")]
    Server { status: u16, message: String },

    /// A success response whose body did not match the expected shape.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// Local durable storage could not be read or written.
    #[error("storage unavailable: {0}")]
    Storage(#[from] StorageError),

    /// The HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

impl ApiError {
    /// Classify a non-success HTTP status and its raw body.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = extract_message(body).unwrap_or_else(|| default_reason(status).to_owned());
        match status {
            401 | 403 => Self::Unauthorized { status, message },
            400..=499 => Self::Validation { status, message },
            _ => Self::Server { status, message },
        }
    }

    /// HTTP status for response-bearing failures.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status, .. } | Self::Validation { status, .. } | Self::Server { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// The backend's message when one was sent, else `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Unauthorized { message, .. } | Self::Validation { message, .. } | Self::Server { message, .. }
                if !message.is_empty() =>
            {
                message.clone()
            }
            _ => fallback.to_owned(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() { Self::Decode(e.to_string()) } else { Self::Network(e.to_string()) }
    }
}

/// Pull a human-readable message out of an error body.
///
/// Accepts `{"message": "..."}`, `{"error": "..."}`, a flat field-error map
/// (`{"email": "Email is required"}`), or a plain-text body.
fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) else {
        return Some(trimmed.to_owned());
    };
    let obj = value.as_object()?;
    for key in ["message", "error"] {
        if let Some(msg) = obj.get(key).and_then(serde_json::Value::as_str) {
            if !msg.is_empty() {
                return Some(msg.to_owned());
            }
        }
    }
    let mut fields: Vec<(&String, &str)> =
        obj.iter().filter_map(|(k, v)| v.as_str().map(|msg| (k, msg))).collect();
    if fields.is_empty() {
        return None;
    }
    fields.sort_by(|a, b| a.0.cmp(b.0));
    Some(fields.into_iter().map(|(_, msg)| msg).collect::<Vec<_>>().join("; "))
}

fn default_reason(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Request failed",
    }
}

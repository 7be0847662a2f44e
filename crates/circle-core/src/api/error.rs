use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Categories of API failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// Connection refused, DNS failure, broken body stream
    Transport,
    /// Request exceeded the configured timeout
    Timeout,
    /// Non-success HTTP status other than an auth rejection
    HttpStatus,
    /// 401/403: the token is missing, invalid, or expired
    Unauthorized,
    /// Response body did not match the expected shape
    Parse,
    /// Rejected locally before any request was sent
    Validation,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Transport => write!(f, "transport"),
            ApiErrorKind::Timeout => write!(f, "timeout"),
            ApiErrorKind::HttpStatus => write!(f, "http_status"),
            ApiErrorKind::Unauthorized => write!(f, "unauthorized"),
            ApiErrorKind::Parse => write!(f, "parse"),
            ApiErrorKind::Validation => write!(f, "validation"),
        }
    }
}

/// Structured error from the API client with kind and details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error category
    pub kind: ApiErrorKind,
    /// HTTP status, when the server answered
    pub status: Option<u16>,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
            details: None,
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Validation, message)
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Parse, message)
    }

    /// Creates an HTTP status error.
    ///
    /// The backend reports failures as `{"error": "..."}` (or `{"detail": "..."}`
    /// from the framework); that text becomes the message when present.
    pub fn http_status(status: u16, body: &str) -> Self {
        let kind = if matches!(status, 401 | 403) {
            ApiErrorKind::Unauthorized
        } else {
            ApiErrorKind::HttpStatus
        };
        let server_message = serde_json::from_str::<Value>(body).ok().and_then(|json| {
            ["error", "detail"]
                .iter()
                .find_map(|key| json.get(*key).and_then(Value::as_str).map(str::to_string))
        });
        let message = match server_message {
            Some(msg) => format!("HTTP {status}: {msg}"),
            None => format!("HTTP {status}"),
        };
        Self {
            kind,
            status: Some(status),
            message,
            details: (!body.is_empty()).then(|| body.to_string()),
        }
    }

    /// Maps a reqwest failure onto the taxonomy.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ApiErrorKind::Timeout, "Request timed out")
        } else if err.is_decode() {
            Self::parse(format!("Unexpected response body: {err}"))
        } else {
            Self::new(ApiErrorKind::Transport, format!("Request failed: {err}"))
        }
    }

    /// True for 401/403 responses.
    pub fn is_unauthorized(&self) -> bool {
        self.kind == ApiErrorKind::Unauthorized
    }

    /// True when the server answered (as opposed to the request never landing).
    pub fn is_server_rejection(&self) -> bool {
        matches!(
            self.kind,
            ApiErrorKind::HttpStatus | ApiErrorKind::Unauthorized
        )
    }

    /// Text for inline error display on forms.
    ///
    /// Prefers the server's own wording, without the status prefix.
    pub fn user_message(&self) -> String {
        match self.kind {
            ApiErrorKind::HttpStatus | ApiErrorKind::Unauthorized => self
                .message
                .split_once(": ")
                .map_or_else(|| self.message.clone(), |(_, msg)| msg.to_string()),
            ApiErrorKind::Transport | ApiErrorKind::Timeout => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            ApiErrorKind::Parse | ApiErrorKind::Validation => self.message.clone(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<circle_types::ValidationError> for ApiError {
    fn from(err: circle_types::ValidationError) -> Self {
        Self::validation(err.to_string())
    }
}

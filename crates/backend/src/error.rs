//! Errors returned by the backend client.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when calling the commerce backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The call needs a logged-in visitor and none is present.
    #[error("not logged in")]
    NotLoggedIn,

    /// The backend rejected the credentials, even after a token refresh.
    #[error("unauthorized")]
    Unauthorized,

    /// The access token could not be refreshed.
    #[error("token refresh failed: {0}")]
    TokenRefresh(String),

    /// The access token is not a readable JWT.
    #[error("invalid access token: {0}")]
    InvalidToken(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The resource already exists (e.g. a coupon already issued).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other 4xx with the backend's message.
    #[error("Rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// 5xx from the backend.
    #[error("Backend error ({status}): {message}")]
    Server { status: u16, message: String },
}

impl BackendError {
    /// Build the error for a non-success status and its body.
    #[must_use]
    pub fn from_status(status: StatusCode, body: &str, retry_after: Option<u64>) -> Self {
        let message = extract_message(body);
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::CONFLICT => Self::Conflict(message),
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited(retry_after.unwrap_or(1)),
            s if s.is_client_error() => Self::Rejected {
                status: s.as_u16(),
                message,
            },
            s => Self::Server {
                status: s.as_u16(),
                message,
            },
        }
    }

    /// A message that is safe to show to the visitor, if there is one.
    #[must_use]
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Conflict(message) | Self::NotFound(message) | Self::Rejected { message, .. }
                if !message.is_empty() =>
            {
                Some(message)
            }
            _ => None,
        }
    }

    /// Whether the visitor has to log in (again).
    #[must_use]
    pub const fn needs_login(&self) -> bool {
        matches!(
            self,
            Self::NotLoggedIn | Self::Unauthorized | Self::TokenRefresh(_)
        )
    }

    /// Whether the failure is on the backend's side or in transport.
    #[must_use]
    pub const fn is_server_side(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Parse(_) | Self::Url(_) | Self::Server { .. }
        )
    }
}

/// Pull a readable message out of an error body.
///
/// Spring-style bodies carry `message`; anything else is truncated text.
fn extract_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error", "detail"] {
            if let Some(text) = value.get(key).and_then(serde_json::Value::as_str) {
                return text.to_string();
            }
        }
    }
    body.trim().chars().take(200).collect()
}

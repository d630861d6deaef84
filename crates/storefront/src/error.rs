//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before the response is built; visitors only ever see
//! a generic message for those.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use shopbag_backend::BackendError;
use thiserror::Error;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// A backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// The session store could not be read or written.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Backend(err) => match err {
                BackendError::NotFound(_) => StatusCode::NOT_FOUND,
                BackendError::Conflict(_) => StatusCode::CONFLICT,
                BackendError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                BackendError::Rejected { .. } => StatusCode::BAD_REQUEST,
                BackendError::NotLoggedIn
                | BackendError::Unauthorized
                | BackendError::TokenRefresh(_)
                | BackendError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    const fn is_server_side(&self) -> bool {
        match self {
            Self::Backend(err) => err.is_server_side(),
            Self::Session(_) | Self::Internal(_) => true,
            Self::NotFound(_) | Self::BadRequest(_) => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_side() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        if matches!(&self, Self::Backend(err) if err.needs_login()) {
            return Redirect::to("/auth/login").into_response();
        }

        let message = match &self {
            Self::Backend(err) => err
                .user_message()
                .map_or_else(|| "The shop is temporarily unavailable".to_string(), String::from),
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (self.status(), message).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// The message to show when the backend refuses a form submission.
///
/// # Errors
///
/// Any error other than `Rejected` or `Conflict` is passed through.
pub fn refusal_message(err: BackendError, fallback: &str) -> Result<String> {
    match err {
        BackendError::Rejected { .. } | BackendError::Conflict(_) => {
            Ok(err.user_message().unwrap_or(fallback).to_string())
        }
        err => Err(err.into()),
    }
}

/// Associate later Sentry events with the logged-in member.
pub fn set_sentry_user(email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            email: Some(email.to_string()),
            ..Default::default()
        }));
    });
}

pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Record a visitor action that shows up in later Sentry reports.
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Applied coupon", Some(&[("product_id", "12")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data.unwrap_or_default() {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_display() {
        assert_eq!(
            AppError::NotFound("product 9".to_string()).to_string(),
            "Not found: product 9"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(status(AppError::NotFound(String::new())), StatusCode::NOT_FOUND);
        assert_eq!(status(AppError::BadRequest(String::new())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(AppError::Internal(String::new())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(BackendError::Conflict("dup".to_string()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(
                BackendError::Server {
                    status: 500,
                    message: String::new()
                }
                .into()
            ),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_expired_login_redirects() {
        let response =
            AppError::from(BackendError::TokenRefresh("HTTP 401".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/auth/login");
    }

    #[test]
    fn test_refusals_become_form_messages() {
        let duplicate = BackendError::Rejected {
            status: 400,
            message: "This address is already saved.".to_string(),
        };
        assert_eq!(
            refusal_message(duplicate, "Could not save.").unwrap(),
            "This address is already saved."
        );
        assert_eq!(
            refusal_message(BackendError::Conflict(String::new()), "Could not save.").unwrap(),
            "Could not save."
        );
    }

    #[test]
    fn test_outages_are_not_form_messages() {
        let outage = BackendError::Server {
            status: 503,
            message: String::new(),
        };
        assert!(matches!(
            refusal_message(outage, "Could not save."),
            Err(AppError::Backend(BackendError::Server { status: 503, .. }))
        ));
    }
}

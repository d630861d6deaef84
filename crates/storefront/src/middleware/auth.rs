//! Member authentication extractors.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, Uri, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};

/// Extractor for pages that need a logged-in member.
///
/// Visitors who are not logged in are sent to the login page and come back
/// to the requested URL afterwards.
///
/// ```rust,ignore
/// async fn coupons(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Coupons for {}", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

pub enum AuthRejection {
    /// HTML requests go to the login page.
    RedirectToLogin { next: String },
    /// API requests get a bare 401.
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin { next } => Redirect::to(&login_url(&next)).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Login page URL that returns to `next` afterwards.
#[must_use]
pub fn login_url(next: &str) -> String {
    if next.is_empty() || next == "/" {
        "/auth/login".to_string()
    } else {
        format!("/auth/login?next={}", urlencoding::encode(next))
    }
}

fn path_and_query(uri: &Uri) -> String {
    uri.path_and_query()
        .map_or_else(|| uri.path().to_string(), ToString::to_string)
}

async fn session_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match session_user(parts).await {
            Some(user) => Ok(Self(user)),
            None if parts.uri.path().starts_with("/api/") => Err(AuthRejection::Unauthorized),
            None => Err(AuthRejection::RedirectToLogin {
                next: path_and_query(&parts.uri),
            }),
        }
    }
}

/// Extractor for pages that render differently for members.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_url_keeps_return_path() {
        assert_eq!(login_url("/"), "/auth/login");
        assert_eq!(
            login_url("/coupons?page=2"),
            "/auth/login?next=%2Fcoupons%3Fpage%3D2"
        );
    }

    #[test]
    fn test_path_and_query() {
        let uri: Uri = "/cart/coupons/3?x=1".parse().unwrap();
        assert_eq!(path_and_query(&uri), "/cart/coupons/3?x=1");
    }
}

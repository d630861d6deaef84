//! Authentication extractor for admin.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentAdmin, session_keys};

/// Extractor that requires admin authentication.
///
/// Visitors without an admin login are sent to the login page.
///
/// ```rust,ignore
/// async fn protected_handler(RequireAdminAuth(admin): RequireAdminAuth) -> impl IntoResponse {
///     format!("Hello, {}!", admin.email)
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Error returned when admin authentication is required but the user is not logged in.
pub enum AdminAuthRejection {
    RedirectToLogin,
    /// The session layer is missing.
    Unauthorized,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAdminAuth
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminAuthRejection::Unauthorized)?;

        let admin: CurrentAdmin = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten()
            .ok_or(AdminAuthRejection::RedirectToLogin)?;

        Ok(Self(admin))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;
    use tower_sessions::MemoryStore;

    use super::*;

    async fn extract(session: Option<Session>) -> Result<RequireAdminAuth, AdminAuthRejection> {
        let mut request = Request::builder().uri("/products").body(()).unwrap();
        if let Some(session) = session {
            request.extensions_mut().insert(session);
        }
        let (mut parts, ()) = request.into_parts();
        RequireAdminAuth::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_anonymous_session_redirects_to_login() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let rejection = extract(Some(session)).await.err().unwrap();
        assert_eq!(rejection.into_response().status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_logged_in_admin_is_extracted() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let admin = CurrentAdmin {
            email: "admin@shop.kr".to_string(),
        };
        session.insert(session_keys::CURRENT_ADMIN, &admin).await.unwrap();
        let RequireAdminAuth(found) = extract(Some(session)).await.ok().unwrap();
        assert_eq!(found, admin);
    }

    #[tokio::test]
    async fn test_missing_session_layer_is_unauthorized() {
        let rejection = extract(None).await.err().unwrap();
        assert_eq!(rejection.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}

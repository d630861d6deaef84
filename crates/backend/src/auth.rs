//! Visitor credentials and the auth endpoints.
//!
//! The backend issues a short-lived access token (a JWT sent as a bearer
//! token) and a refresh token delivered as the `refreshToken` cookie.
//! [`Credentials`] holds both for the duration of one web request and lets
//! concurrent backend calls share a single refresh.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::header::{COOKIE, HeaderMap, SET_COOKIE};
use serde::{Deserialize, Serialize};
use shopbag_core::types::{Email, Password, Role, SignupPhone};
use tokio::sync::Mutex;
use tracing::instrument;

use crate::BackendClient;
use crate::error::BackendError;

/// Name of the cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Token pair for one logged-in visitor.
///
/// Implements `Debug` manually to redact both tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTokens")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Claims read from the access token payload.
///
/// The signature is not checked here; the backend verifies every call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessClaims {
    /// Subject, usually the member's email.
    #[serde(default)]
    pub sub: Option<String>,
    /// Comma-separated granted roles.
    #[serde(default)]
    pub auth: Option<String>,
    /// Expiry as a Unix timestamp.
    #[serde(default)]
    pub exp: Option<i64>,
}

impl AccessClaims {
    #[must_use]
    pub fn role(&self) -> Role {
        self.auth.as_deref().map_or(Role::User, Role::from_claim)
    }
}

impl AuthTokens {
    /// Decode the access token's payload.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken` when the token is not a three-part JWT with a
    /// base64url JSON payload.
    pub fn claims(&self) -> Result<AccessClaims, BackendError> {
        let mut parts = self.access_token.split('.');
        let payload = match (parts.next(), parts.next(), parts.next()) {
            (Some(_), Some(payload), Some(_)) => payload,
            _ => return Err(BackendError::InvalidToken("expected three segments".into())),
        };
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| BackendError::InvalidToken(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| BackendError::InvalidToken(e.to_string()))
    }
}

/// Credentials shared by every backend call made while serving one request.
///
/// Cloning is cheap. When a call refreshes the access token, the new pair is
/// visible to the other clones and [`Credentials::changed`] reports it so the
/// caller can persist it.
#[derive(Clone, Default)]
pub struct Credentials {
    inner: Arc<CredentialsInner>,
}

#[derive(Default)]
struct CredentialsInner {
    tokens: Mutex<Option<AuthTokens>>,
    changed: AtomicBool,
}

impl Credentials {
    #[must_use]
    pub fn new(tokens: Option<AuthTokens>) -> Self {
        Self {
            inner: Arc::new(CredentialsInner {
                tokens: Mutex::new(tokens),
                changed: AtomicBool::new(false),
            }),
        }
    }

    /// Credentials for a visitor who is not logged in.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub async fn is_logged_in(&self) -> bool {
        self.inner.tokens.lock().await.is_some()
    }

    /// Current token pair, if any.
    pub async fn tokens(&self) -> Option<AuthTokens> {
        self.inner.tokens.lock().await.clone()
    }

    /// Replace the token pair (login) or drop it (logout).
    pub async fn set(&self, tokens: Option<AuthTokens>) {
        *self.inner.tokens.lock().await = tokens;
        self.inner.changed.store(true, Ordering::Release);
    }

    /// Whether the tokens changed since these credentials were created.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.inner.changed.load(Ordering::Acquire)
    }

    pub(crate) async fn access_token(&self) -> Result<String, BackendError> {
        self.inner
            .tokens
            .lock()
            .await
            .as_ref()
            .map(|tokens| tokens.access_token.clone())
            .ok_or(BackendError::NotLoggedIn)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Sign-up form contents after validation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: Email,
    pub password: String,
    pub user_name: String,
    pub phone: String,
}

impl SignupRequest {
    #[must_use]
    pub fn new(email: Email, password: &Password, user_name: String, phone: SignupPhone) -> Self {
        Self {
            email,
            password: password.expose().to_string(),
            user_name,
            phone: phone.as_str().to_string(),
        }
    }
}

/// Read the refresh token from `Set-Cookie` headers.
fn refresh_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .find_map(|pair| pair.trim().strip_prefix("refreshToken="))
        .filter(|token| !token.is_empty())
        .map(String::from)
}

impl BackendClient {
    /// Register a member.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` or `Rejected` with the backend's message when the
    /// account cannot be created.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn signup(&self, request: &SignupRequest) -> Result<(), BackendError> {
        let url = self.endpoint("/api/auth")?;
        self.send(self.http().post(url).json(request)).await?;
        Ok(())
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for bad credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthTokens, BackendError> {
        let url = self.endpoint("/api/auth/login")?;
        let response = self
            .http()
            .post(url)
            .json(&LoginRequest { email, password })
            .send()
            .await?;
        let cookie = refresh_cookie(response.headers());
        let body = self.finish(response).await?;
        let token: TokenResponse = Self::parse(&body, "login")?;
        Ok(AuthTokens {
            access_token: token.access_token,
            refresh_token: cookie.or(token.refresh_token),
        })
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Only one refresh runs per [`Credentials`]; a caller that waited on the
    /// lock while another refreshed gets the new token without a second call.
    pub(crate) async fn refresh(
        &self,
        credentials: &Credentials,
        rejected_token: &str,
    ) -> Result<String, BackendError> {
        let mut guard = credentials.inner.tokens.lock().await;
        let tokens = guard.as_mut().ok_or(BackendError::NotLoggedIn)?;

        if tokens.access_token != rejected_token {
            return Ok(tokens.access_token.clone());
        }

        let refresh_token = tokens
            .refresh_token
            .clone()
            .ok_or_else(|| BackendError::TokenRefresh("no refresh token".to_string()))?;

        let url = self.endpoint("/api/auth/token")?;
        let response = self
            .http()
            .post(url)
            .header(COOKIE, format!("{REFRESH_COOKIE}={refresh_token}"))
            .send()
            .await?;

        let status = response.status();
        let rotated = refresh_cookie(response.headers());
        let text = response.text().await?;
        if !status.is_success() {
            tracing::warn!(status = %status, "Token refresh rejected");
            *guard = None;
            credentials.inner.changed.store(true, Ordering::Release);
            return Err(BackendError::TokenRefresh(format!("HTTP {status}")));
        }

        let token: TokenResponse = Self::parse(&text, "token refresh")?;
        tokens.access_token = token.access_token.clone();
        if let Some(next) = rotated.or(token.refresh_token) {
            tokens.refresh_token = Some(next);
        }
        credentials.inner.changed.store(true, Ordering::Release);
        tracing::debug!("Access token refreshed");

        Ok(token.access_token)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn jwt(payload: &str) -> String {
        format!("eyJhbGciOiJIUzI1NiJ9.{}.sig", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn test_claims_role() {
        let tokens = AuthTokens {
            access_token: jwt(r#"{"sub":"a@b.co","auth":"ROLE_ADMIN","exp":1}"#),
            refresh_token: None,
        };
        let claims = tokens.claims().unwrap();
        assert_eq!(claims.sub.as_deref(), Some("a@b.co"));
        assert_eq!(claims.role(), Role::Admin);
    }

    #[test]
    fn test_claims_default_role() {
        let tokens = AuthTokens {
            access_token: jwt(r#"{"sub":"a@b.co"}"#),
            refresh_token: None,
        };
        assert_eq!(tokens.claims().unwrap().role(), Role::User);
    }

    #[test]
    fn test_claims_rejects_garbage() {
        let tokens = AuthTokens {
            access_token: "not-a-jwt".to_string(),
            refresh_token: None,
        };
        assert!(matches!(
            tokens.claims(),
            Err(BackendError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let tokens = AuthTokens {
            access_token: "access-secret".to_string(),
            refresh_token: Some("refresh-secret".to_string()),
        };
        let debug = format!("{tokens:?}");
        assert!(!debug.contains("access-secret"));
        assert!(!debug.contains("refresh-secret"));
    }

    #[test]
    fn test_refresh_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("JSESSIONID=x; Path=/"));
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("refreshToken=abc.def; HttpOnly; Path=/"),
        );
        assert_eq!(refresh_cookie(&headers).as_deref(), Some("abc.def"));
        assert_eq!(refresh_cookie(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_credentials_set_marks_changed() {
        let credentials = Credentials::anonymous();
        assert!(!credentials.is_logged_in().await);
        assert!(!credentials.changed());
        credentials
            .set(Some(AuthTokens {
                access_token: "t".to_string(),
                refresh_token: None,
            }))
            .await;
        assert!(credentials.is_logged_in().await);
        assert!(credentials.changed());
        assert_eq!(credentials.access_token().await.unwrap(), "t");
    }
}

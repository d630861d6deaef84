//! Session access for console handlers.

use axum::{extract::FromRequestParts, http::StatusCode, http::request::Parts};
use shopbag_backend::{AuthTokens, Credentials};
use tower_sessions::Session;

use crate::error::Result;
use crate::models::{CurrentAdmin, Flash, session_keys};

/// The signed-in admin's session: backend tokens and flash messages.
#[derive(Clone)]
pub struct AdminSession {
    session: Session,
}

impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(Self::new)
            .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "Session layer missing"))
    }
}

impl AdminSession {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    pub async fn current_admin(&self) -> Result<Option<CurrentAdmin>> {
        Ok(self.session.get(session_keys::CURRENT_ADMIN).await?)
    }

    pub async fn credentials(&self) -> Result<Credentials> {
        let tokens: Option<AuthTokens> = self.session.get(session_keys::AUTH_TOKENS).await?;
        Ok(Credentials::new(tokens))
    }

    /// Store an admin login under a fresh session ID.
    pub async fn log_in(&self, tokens: &AuthTokens, admin: &CurrentAdmin) -> Result<()> {
        self.session.cycle_id().await?;
        self.session.insert(session_keys::AUTH_TOKENS, tokens).await?;
        self.session.insert(session_keys::CURRENT_ADMIN, admin).await?;
        Ok(())
    }

    /// Drop the whole session.
    pub async fn log_out(&self) -> Result<()> {
        self.session.flush().await?;
        Ok(())
    }

    /// Persist refreshed tokens. A rejected refresh ends the login.
    pub async fn save_credentials(&self, credentials: &Credentials) -> Result<()> {
        if !credentials.changed() {
            return Ok(());
        }
        if let Some(tokens) = credentials.tokens().await {
            self.session.insert(session_keys::AUTH_TOKENS, &tokens).await?;
        } else {
            tracing::info!("Admin refresh token rejected, ending session");
            self.session
                .remove::<AuthTokens>(session_keys::AUTH_TOKENS)
                .await?;
            self.session
                .remove::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
                .await?;
        }
        Ok(())
    }

    pub async fn flash(&self, flash: Flash) -> Result<()> {
        let mut pending: Vec<Flash> = self
            .session
            .get(session_keys::FLASH)
            .await?
            .unwrap_or_default();
        pending.push(flash);
        self.session.insert(session_keys::FLASH, &pending).await?;
        Ok(())
    }

    pub async fn take_flashes(&self) -> Result<Vec<Flash>> {
        Ok(self
            .session
            .remove::<Vec<Flash>>(session_keys::FLASH)
            .await?
            .unwrap_or_default())
    }
}

/// Layout data for every console page.
#[derive(Debug, Clone, Default)]
pub struct AdminPage {
    pub admin: Option<CurrentAdmin>,
    /// Used to highlight the active nav entry.
    pub current_path: String,
    pub storefront_url: Option<String>,
    pub flashes: Vec<Flash>,
}

impl AdminPage {
    /// # Errors
    ///
    /// Returns an error if the session cannot be read.
    pub async fn load(
        session: &AdminSession,
        current_path: &str,
        storefront_url: Option<&str>,
    ) -> Result<Self> {
        Ok(Self {
            admin: session.current_admin().await?,
            current_path: current_path.to_string(),
            storefront_url: storefront_url.map(String::from),
            flashes: session.take_flashes().await?,
        })
    }

    #[must_use]
    pub fn is_section(&self, prefix: &str) -> bool {
        self.current_path.starts_with(prefix)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn admin_session() -> AdminSession {
        AdminSession::new(Session::new(None, Arc::new(MemoryStore::default()), None))
    }

    fn tokens() -> AuthTokens {
        AuthTokens {
            access_token: "a".to_string(),
            refresh_token: Some("r".to_string()),
        }
    }

    fn admin() -> CurrentAdmin {
        CurrentAdmin {
            email: "admin@shop.kr".to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_exposes_tokens() {
        let session = admin_session();
        session.log_in(&tokens(), &admin()).await.unwrap();
        assert_eq!(session.current_admin().await.unwrap(), Some(admin()));
        assert!(session.credentials().await.unwrap().is_logged_in().await);
    }

    #[tokio::test]
    async fn test_rejected_refresh_ends_login() {
        let session = admin_session();
        session.log_in(&tokens(), &admin()).await.unwrap();

        let credentials = session.credentials().await.unwrap();
        credentials.set(None).await;
        session.save_credentials(&credentials).await.unwrap();

        assert!(session.current_admin().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_page_consumes_flashes() {
        let session = admin_session();
        session.flash(Flash::success("Saved.")).await.unwrap();
        let page = AdminPage::load(&session, "/products", Some("http://localhost:3000"))
            .await
            .unwrap();
        assert_eq!(page.flashes.len(), 1);
        assert!(page.is_section("/products"));
        assert!(session.take_flashes().await.unwrap().is_empty());
    }
}

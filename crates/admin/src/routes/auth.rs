//! Admin login and logout.
//!
//! Credentials are checked by the backend. A valid member login is still
//! refused here unless the access token carries `ROLE_ADMIN`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use shopbag_backend::{AuthTokens, BackendError};
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::models::{CurrentAdmin, Flash};
use crate::services::{AdminPage, AdminSession};
use crate::state::AppState;

const BAD_CREDENTIALS: &str = "Email or password is incorrect.";
const NOT_ADMIN: &str = "This account does not have admin access.";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: AdminPage,
    pub email: String,
    pub error: Option<String>,
}

/// Whether the backend granted admin rights to these tokens.
fn is_admin_login(tokens: &AuthTokens) -> bool {
    tokens
        .claims()
        .map(|claims| claims.role().is_admin())
        .unwrap_or(false)
}

async fn login_template(
    state: &AppState,
    session: &AdminSession,
    email: String,
    error: Option<&str>,
) -> Result<LoginTemplate> {
    Ok(LoginTemplate {
        page: AdminPage::load(
            session,
            "/auth/login",
            state.config().storefront_url.as_deref(),
        )
        .await?,
        email,
        error: error.map(String::from),
    })
}

#[instrument(skip(state, session))]
pub async fn login_page(State(state): State<AppState>, session: AdminSession) -> Result<Response> {
    if session.current_admin().await?.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    Ok(login_template(&state, &session, String::new(), None)
        .await?
        .into_response())
}

#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: AdminSession,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let email = form.email.trim().to_string();
    let tokens = match state.backend().login(&email, &form.password).await {
        Ok(tokens) => tokens,
        Err(
            BackendError::Unauthorized
            | BackendError::NotFound(_)
            | BackendError::Rejected { .. },
        ) => {
            tracing::warn!("Admin login rejected");
            return Ok(login_template(&state, &session, email, Some(BAD_CREDENTIALS))
                .await?
                .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    if !is_admin_login(&tokens) {
        tracing::warn!("Non-admin account tried the admin console");
        return Ok(login_template(&state, &session, email, Some(NOT_ADMIN))
            .await?
            .into_response());
    }

    let admin = CurrentAdmin { email };
    session.log_in(&tokens, &admin).await?;
    set_sentry_user(&admin.email);
    tracing::info!("Admin logged in");

    Ok(Redirect::to("/").into_response())
}

#[instrument(skip(session))]
pub async fn logout(session: AdminSession) -> Result<Response> {
    session.log_out().await?;
    clear_sentry_user();
    session.flash(Flash::success("Logged out.")).await?;
    Ok(Redirect::to("/auth/login").into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    use super::*;

    fn tokens_with(payload: &str) -> AuthTokens {
        AuthTokens {
            access_token: format!("h.{}.s", URL_SAFE_NO_PAD.encode(payload)),
            refresh_token: None,
        }
    }

    #[test]
    fn test_admin_role_admitted() {
        assert!(is_admin_login(&tokens_with(
            r#"{"sub":"admin@shop.kr","auth":"ROLE_ADMIN"}"#
        )));
    }

    #[test]
    fn test_member_role_refused() {
        assert!(!is_admin_login(&tokens_with(
            r#"{"sub":"kim@shop.kr","auth":"ROLE_USER"}"#
        )));
    }

    #[test]
    fn test_malformed_token_refused() {
        let tokens = AuthTokens {
            access_token: "opaque".to_string(),
            refresh_token: None,
        };
        assert!(!is_admin_login(&tokens));
    }
}

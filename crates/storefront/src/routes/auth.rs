//! Sign up, login and logout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use shopbag_backend::{BackendError, SignupRequest};
use shopbag_core::types::{Email, Password, SignupPhone};
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::models::{CurrentUser, Flash};
use crate::services::{PageContext, Visitor, cart_sync};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub next: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    #[serde(default)]
    pub next: String,
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub email: String,
    pub next: String,
    pub error: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub page: PageContext,
    pub email: String,
    pub user_name: String,
    pub phone: String,
    pub errors: Vec<String>,
}

/// Only same-site paths are followed after login.
fn safe_next(next: &str) -> &str {
    if next.starts_with('/') && !next.starts_with("//") && !next.starts_with("/\\") {
        next
    } else {
        "/"
    }
}

impl SignupForm {
    /// Check every field, collecting one message per problem.
    fn validate(&self) -> std::result::Result<SignupRequest, Vec<String>> {
        let mut errors = Vec::new();

        let email = Email::parse(self.email.trim())
            .map_err(|e| errors.push(format!("Email: {e}")))
            .ok();
        let password = Password::parse(&self.password)
            .map_err(|e| errors.push(format!("Password: {e}")))
            .ok();
        if let Some(password) = &password {
            if let Err(e) = password.confirm(&self.password_confirm) {
                errors.push(format!("Password: {e}"));
            }
        }
        let user_name = self.user_name.trim();
        if user_name.is_empty() {
            errors.push("Name is required".to_string());
        }
        let phone = SignupPhone::parse(self.phone.trim())
            .map_err(|e| errors.push(format!("Phone: {e}")))
            .ok();

        match (email, password, phone) {
            (Some(email), Some(password), Some(phone)) if errors.is_empty() => Ok(
                SignupRequest::new(email, &password, user_name.to_string(), phone),
            ),
            _ => Err(errors),
        }
    }
}

// =============================================================================
// Login
// =============================================================================

/// Display the login page.
#[instrument(skip(state, visitor))]
pub async fn login_page(
    State(state): State<AppState>,
    visitor: Visitor,
    Query(query): Query<NextQuery>,
) -> Result<impl IntoResponse> {
    Ok(LoginTemplate {
        page: PageContext::load(&state, &visitor).await?,
        email: String::new(),
        next: safe_next(&query.next).to_string(),
        error: None,
    })
}

/// Log in through the backend, then merge the member's saved cart.
#[instrument(skip(state, visitor, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    visitor: Visitor,
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
            tracing::info!("Login rejected");
            return Ok(LoginTemplate {
                page: PageContext::load(&state, &visitor).await?,
                email,
                next: safe_next(&form.next).to_string(),
                error: Some("Email or password is incorrect.".to_string()),
            }
            .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let user = CurrentUser::from_tokens(&tokens, &email);
    visitor.log_in(&tokens, &user).await?;
    set_sentry_user(&user.email);
    tracing::info!(admin = user.is_admin(), "Member logged in");

    cart_sync::merge_after_login(state.backend(), &visitor).await?;

    Ok(Redirect::to(safe_next(&form.next)).into_response())
}

/// Log out, taking the member's cart and checkout state with them.
#[instrument(skip(visitor))]
pub async fn logout(visitor: Visitor) -> Result<Response> {
    visitor.log_out().await?;
    clear_sentry_user();
    visitor.flash(Flash::info("You have been logged out.")).await?;
    Ok(Redirect::to("/").into_response())
}

// =============================================================================
// Sign up
// =============================================================================

#[instrument(skip(state, visitor))]
pub async fn signup_page(
    State(state): State<AppState>,
    visitor: Visitor,
) -> Result<impl IntoResponse> {
    Ok(SignupTemplate {
        page: PageContext::load(&state, &visitor).await?,
        email: String::new(),
        user_name: String::new(),
        phone: String::new(),
        errors: Vec::new(),
    })
}

/// Create an account, then send the visitor to log in.
#[instrument(skip(state, visitor, form), fields(email = %form.email))]
pub async fn signup(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<SignupForm>,
) -> Result<Response> {
    let result = match form.validate() {
        Ok(request) => match state.backend().signup(&request).await {
            Ok(()) => Ok(()),
            Err(e @ (BackendError::Conflict(_) | BackendError::Rejected { .. })) => Err(vec![
                e.user_message()
                    .unwrap_or("This email is already registered.")
                    .to_string(),
            ]),
            Err(e) => return Err(e.into()),
        },
        Err(errors) => Err(errors),
    };

    match result {
        Ok(()) => {
            tracing::info!("Member signed up");
            visitor
                .flash(Flash::success("Welcome! Log in with your new account."))
                .await?;
            Ok(Redirect::to("/auth/login").into_response())
        }
        Err(errors) => Ok(SignupTemplate {
            page: PageContext::load(&state, &visitor).await?,
            email: form.email.trim().to_string(),
            user_name: form.user_name.trim().to_string(),
            phone: form.phone.trim().to_string(),
            errors,
        }
        .into_response()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn signup_form() -> SignupForm {
        SignupForm {
            email: "kim@shop.kr".to_string(),
            password: "secret123".to_string(),
            password_confirm: "secret123".to_string(),
            user_name: "Kim".to_string(),
            phone: "01012345678".to_string(),
        }
    }

    #[test]
    fn test_safe_next_rejects_offsite_targets() {
        assert_eq!(safe_next("/cart"), "/cart");
        assert_eq!(safe_next("//evil.example"), "/");
        assert_eq!(safe_next("https://evil.example"), "/");
        assert_eq!(safe_next(""), "/");
    }

    #[test]
    fn test_valid_signup_passes() {
        assert!(signup_form().validate().is_ok());
    }

    #[test]
    fn test_signup_collects_every_error() {
        let form = SignupForm {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            password_confirm: "other".to_string(),
            user_name: " ".to_string(),
            phone: "010-1234".to_string(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors[0].starts_with("Email"));
        assert!(errors.iter().any(|e| e == "Name is required"));
    }

    #[test]
    fn test_password_mismatch_reported() {
        let mut form = signup_form();
        form.password_confirm = "secret124".to_string();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Password"));
    }
}

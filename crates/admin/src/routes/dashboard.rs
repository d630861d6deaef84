//! Console landing page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::services::{AdminPage, AdminSession};
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub page: AdminPage,
}

#[instrument(skip(state, session, _admin))]
pub async fn dashboard(
    State(state): State<AppState>,
    session: AdminSession,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> Result<impl IntoResponse> {
    Ok(DashboardTemplate {
        page: AdminPage::load(&session, "/", state.config().storefront_url.as_deref()).await?,
    })
}

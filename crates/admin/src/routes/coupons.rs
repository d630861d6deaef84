//! Who downloaded a coupon.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use shopbag_backend::types::CouponMember;
use shopbag_core::pagination::Pager;
use shopbag_core::types::CouponId;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::{Flash, PagerView};
use crate::services::{AdminPage, AdminSession};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    #[serde(default)]
    pub coupon_id: String,
}

#[derive(Debug, Deserialize)]
pub struct MembersQuery {
    /// 1-based.
    #[serde(default = "first_page")]
    pub page: u32,
}

const fn first_page() -> u32 {
    1
}

#[derive(Template, WebTemplate)]
#[template(path = "coupons/index.html")]
pub struct CouponLookupTemplate {
    pub page: AdminPage,
}

#[derive(Template, WebTemplate)]
#[template(path = "coupons/members.html")]
pub struct CouponMembersTemplate {
    pub page: AdminPage,
    pub coupon_id: CouponId,
    pub members: Vec<CouponMember>,
    pub pager: PagerView,
}

async fn page(state: &AppState, session: &AdminSession) -> Result<AdminPage> {
    AdminPage::load(session, "/coupons", state.config().storefront_url.as_deref()).await
}

/// Coupon lookup form. Submitting it jumps to the member list.
#[instrument(skip(state, session, _admin))]
pub async fn index(
    State(state): State<AppState>,
    session: AdminSession,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Query(query): Query<LookupQuery>,
) -> Result<Response> {
    let raw = query.coupon_id.trim();
    if raw.is_empty() {
        return Ok(CouponLookupTemplate {
            page: page(&state, &session).await?,
        }
        .into_response());
    }
    match raw.parse::<CouponId>() {
        Ok(id) => Ok(Redirect::to(&format!("/coupons/{id}/members")).into_response()),
        Err(_) => {
            session
                .flash(Flash::error("Coupon ID must be a number."))
                .await?;
            Ok(Redirect::to("/coupons").into_response())
        }
    }
}

#[instrument(skip(state, session, _admin), fields(coupon_id = %id))]
pub async fn members(
    State(state): State<AppState>,
    session: AdminSession,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<CouponId>,
    Query(query): Query<MembersQuery>,
) -> Result<impl IntoResponse> {
    let current = query.page.max(1);
    let credentials = session.credentials().await?;
    let result = state.backend().coupon_members(&credentials, id, current).await;
    session.save_credentials(&credentials).await?;
    let page_data = result?;

    Ok(CouponMembersTemplate {
        page: page(&state, &session).await?,
        coupon_id: id,
        pager: PagerView::new(&Pager::one_based(current, page_data.total_pages), "", "page"),
        members: page_data.members,
    })
}

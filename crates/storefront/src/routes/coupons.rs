//! Member coupons, code registration and welcome coupons.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use shopbag_backend::BackendError;
use shopbag_backend::types::{MemberCoupon, WelcomeCoupon};
use shopbag_core::pagination::Pager;
use shopbag_core::types::CouponId;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::middleware::auth::login_url;
use crate::models::Flash;
use crate::services::{PageContext, Visitor};
use crate::state::AppState;

const ALREADY_ISSUED: &str = "This coupon has already been issued to you.";

#[derive(Debug, Deserialize)]
pub struct CouponListQuery {
    /// 1-based.
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub include_inactive: bool,
}

const fn first_page() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct CouponCodeForm {
    pub code: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "coupons/index.html")]
pub struct CouponListTemplate {
    pub page: PageContext,
    pub coupons: Vec<MemberCoupon>,
    pub pager: Pager,
    pub include_inactive: bool,
}

/// A welcome coupon and whether this visitor already took it.
pub struct WelcomeCouponView {
    pub coupon: WelcomeCoupon,
    pub downloaded: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "coupons/welcome.html")]
pub struct WelcomeTemplate {
    pub page: PageContext,
    pub coupons: Vec<WelcomeCouponView>,
}

/// Outcome of issuing a coupon code to the member.
enum Issue {
    Issued,
    AlreadyIssued,
    Refused(String),
}

fn issue_outcome(
    result: std::result::Result<(), BackendError>,
) -> std::result::Result<Issue, BackendError> {
    match result {
        Ok(()) => Ok(Issue::Issued),
        Err(BackendError::Conflict(_)) => Ok(Issue::AlreadyIssued),
        Err(e @ (BackendError::NotFound(_) | BackendError::Rejected { .. })) => Ok(Issue::Refused(
            e.user_message()
                .unwrap_or("This coupon code is not valid.")
                .to_string(),
        )),
        Err(e) => Err(e),
    }
}

/// List the member's coupons.
#[instrument(skip(state, visitor, _user))]
pub async fn index(
    State(state): State<AppState>,
    visitor: Visitor,
    RequireAuth(_user): RequireAuth,
    Query(query): Query<CouponListQuery>,
) -> Result<impl IntoResponse> {
    let page = query.page.max(1);
    let credentials = visitor.credentials().await?;
    let result = state
        .backend()
        .member_coupons(&credentials, page, query.include_inactive)
        .await;
    visitor.save_credentials(&credentials).await?;
    let coupons = result?;

    Ok(CouponListTemplate {
        page: PageContext::load(&state, &visitor).await?,
        pager: Pager::one_based(page, coupons.total_pages),
        coupons: coupons.coupons,
        include_inactive: query.include_inactive,
    })
}

/// Register a coupon code.
#[instrument(skip(state, visitor, _user, form))]
pub async fn register(
    State(state): State<AppState>,
    visitor: Visitor,
    RequireAuth(_user): RequireAuth,
    Form(form): Form<CouponCodeForm>,
) -> Result<Response> {
    let code = form.code.trim();
    if code.is_empty() {
        visitor.flash(Flash::error("Enter a coupon code.")).await?;
        return Ok(Redirect::to("/coupons").into_response());
    }

    let credentials = visitor.credentials().await?;
    let result = state.backend().register_coupon(&credentials, code).await;
    visitor.save_credentials(&credentials).await?;

    let flash = match issue_outcome(result)? {
        Issue::Issued => Flash::success("Coupon registered."),
        Issue::AlreadyIssued => Flash::error(ALREADY_ISSUED),
        Issue::Refused(message) => Flash::error(message),
    };
    visitor.flash(flash).await?;
    Ok(Redirect::to("/coupons").into_response())
}

/// Welcome coupons anyone can download.
#[instrument(skip(state, visitor))]
pub async fn welcome(State(state): State<AppState>, visitor: Visitor) -> Result<impl IntoResponse> {
    let downloaded = visitor.downloaded_coupons().await?;
    let coupons = state
        .backend()
        .welcome_coupons()
        .await?
        .into_iter()
        .map(|coupon| WelcomeCouponView {
            downloaded: downloaded.contains(&coupon.code),
            coupon,
        })
        .collect();

    Ok(WelcomeTemplate {
        page: PageContext::load(&state, &visitor).await?,
        coupons,
    })
}

/// Download a welcome coupon.
///
/// Once issued (now or earlier) the coupon is marked so its button is
/// disabled.
#[instrument(skip(state, visitor, form), fields(code = %form.code))]
pub async fn download(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<CouponCodeForm>,
) -> Result<Response> {
    if visitor.current_user().await?.is_none() {
        visitor
            .flash(Flash::info("Log in to download coupons."))
            .await?;
        return Ok(Redirect::to(&login_url("/coupons/welcome")).into_response());
    }

    let credentials = visitor.credentials().await?;
    let result = state
        .backend()
        .register_coupon(&credentials, &form.code)
        .await;
    visitor.save_credentials(&credentials).await?;

    let flash = match issue_outcome(result)? {
        Issue::Issued => {
            visitor.mark_coupon_downloaded(form.code.trim()).await?;
            Flash::success("Coupon downloaded. Find it under My coupons.")
        }
        Issue::AlreadyIssued => {
            visitor.mark_coupon_downloaded(form.code.trim()).await?;
            Flash::error(ALREADY_ISSUED)
        }
        Issue::Refused(message) => Flash::error(message),
    };
    visitor.flash(flash).await?;
    Ok(Redirect::to("/coupons/welcome").into_response())
}

/// Jump from a used coupon to the order it was used on.
#[instrument(skip(state, visitor, _user), fields(coupon_id = %id))]
pub async fn order(
    State(state): State<AppState>,
    visitor: Visitor,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<CouponId>,
) -> Result<Response> {
    let credentials = visitor.credentials().await?;
    let result = state.backend().coupon_order(&credentials, id).await;
    visitor.save_credentials(&credentials).await?;

    match result {
        Ok(order_id) => Ok(Redirect::to(&format!("/orders/{order_id}")).into_response()),
        Err(BackendError::NotFound(_)) => {
            visitor
                .flash(Flash::info("No order was found for this coupon."))
                .await?;
            Ok(Redirect::to("/coupons?include_inactive=true").into_response())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_means_already_issued() {
        let outcome = issue_outcome(Err(BackendError::Conflict("dup".to_string())));
        assert!(matches!(outcome, Ok(Issue::AlreadyIssued)));
    }

    #[test]
    fn test_rejected_code_keeps_backend_message() {
        let outcome = issue_outcome(Err(BackendError::Rejected {
            status: 400,
            message: "Expired coupon".to_string(),
        }));
        assert!(matches!(outcome, Ok(Issue::Refused(ref m)) if m == "Expired coupon"));
    }

    #[test]
    fn test_server_errors_propagate() {
        let outcome = issue_outcome(Err(BackendError::Server {
            status: 503,
            message: String::new(),
        }));
        assert!(outcome.is_err());
    }
}

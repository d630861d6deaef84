//! Banner management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use shopbag_backend::{BackendError, BannerUpload};
use shopbag_core::catalog::{Banner, sorted_banners, validate_display_order};
use shopbag_core::pagination::{Pager, paginate, total_pages};
use shopbag_core::types::BannerId;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::{Flash, PagerView};
use crate::services::uploads::UploadForm;
use crate::services::{AdminPage, AdminSession};
use crate::state::AppState;

const PAGE_SIZE: usize = 10;

#[derive(Debug, Deserialize)]
pub struct BannerListQuery {
    #[serde(default = "first_page")]
    pub page: u32,
}

const fn first_page() -> u32 {
    1
}

#[derive(Template, WebTemplate)]
#[template(path = "banners/index.html")]
pub struct BannerListTemplate {
    pub page: AdminPage,
    pub banners: Vec<Banner>,
    pub pager: PagerView,
}

#[derive(Debug, Clone, Default)]
pub struct BannerFormView {
    pub title: String,
    pub display_order: String,
    pub target_url: String,
    pub image_url: Option<String>,
}

impl From<&Banner> for BannerFormView {
    fn from(banner: &Banner) -> Self {
        Self {
            title: banner.title.clone(),
            display_order: banner.display_order.to_string(),
            target_url: banner.target_url.clone().unwrap_or_default(),
            image_url: Some(banner.image_url.clone()),
        }
    }
}

impl BannerFormView {
    fn from_upload(form: &UploadForm, image_url: Option<String>) -> Self {
        Self {
            title: form.text("title").to_string(),
            display_order: form.text("display_order").to_string(),
            target_url: form.text("target_url").to_string(),
            image_url,
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "banners/form.html")]
pub struct BannerFormTemplate {
    pub page: AdminPage,
    pub banner_id: Option<BannerId>,
    pub form: BannerFormView,
    pub error: Option<String>,
}

/// Build the upload. A new banner needs an image; edits may keep the old one.
fn build_upload(form: &mut UploadForm, creating: bool) -> Result<BannerUpload> {
    let title = form.text("title").to_string();
    if title.is_empty() {
        return Err(AppError::BadRequest("Banner title is required".to_string()));
    }
    let display_order = form.integer("display_order", "Display order")?;
    let display_order = validate_display_order("display order", display_order)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let target_url = Some(form.text("target_url").to_string()).filter(|url| !url.is_empty());
    if let Some(url) = &target_url {
        if !url.starts_with('/') && url::Url::parse(url).is_err() {
            return Err(AppError::BadRequest(
                "Target URL must be a path or a full URL".to_string(),
            ));
        }
    }

    let image = form.take_file("image");
    if creating && image.is_none() {
        return Err(AppError::BadRequest("Add a banner image".to_string()));
    }
    Ok(BannerUpload {
        title,
        display_order,
        target_url,
        image,
    })
}

fn form_error(error: AppError) -> Result<String> {
    match error {
        AppError::BadRequest(message) => Ok(message),
        AppError::Backend(e @ (BackendError::Rejected { .. } | BackendError::Conflict(_))) => Ok(e
            .user_message()
            .unwrap_or("The backend rejected the banner.")
            .to_string()),
        other => Err(other),
    }
}

async fn find(state: &AppState, id: BannerId) -> Result<Banner> {
    state
        .backend()
        .banners()
        .await?
        .iter()
        .find(|b| b.id == id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("banner {id}")))
}

async fn page(state: &AppState, session: &AdminSession) -> Result<AdminPage> {
    AdminPage::load(session, "/banners", state.config().storefront_url.as_deref()).await
}

fn banners_redirect() -> Response {
    Redirect::to("/banners").into_response()
}

#[instrument(skip(state, session, _admin))]
pub async fn index(
    State(state): State<AppState>,
    session: AdminSession,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Query(query): Query<BannerListQuery>,
) -> Result<impl IntoResponse> {
    let banners = sorted_banners(&state.backend().banners().await?);
    let total = total_pages(banners.len(), PAGE_SIZE);
    let current = query.page.clamp(1, total);

    Ok(BannerListTemplate {
        page: page(&state, &session).await?,
        banners: paginate(&banners, current, PAGE_SIZE).to_vec(),
        pager: PagerView::new(&Pager::one_based(current, total), "", "page"),
    })
}

#[instrument(skip(state, session, _admin))]
pub async fn new(
    State(state): State<AppState>,
    session: AdminSession,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> Result<impl IntoResponse> {
    Ok(BannerFormTemplate {
        page: page(&state, &session).await?,
        banner_id: None,
        form: BannerFormView::default(),
        error: None,
    })
}

#[instrument(skip(state, session, _admin, multipart))]
pub async fn create(
    State(state): State<AppState>,
    session: AdminSession,
    RequireAdminAuth(_admin): RequireAdminAuth,
    multipart: Multipart,
) -> Result<Response> {
    let mut form = UploadForm::read(multipart).await?;

    let result = match build_upload(&mut form, true) {
        Ok(upload) => {
            let credentials = session.credentials().await?;
            let result = state.backend().create_banner(&credentials, &upload).await;
            session.save_credentials(&credentials).await?;
            result.map_err(AppError::from)
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            session.flash(Flash::success("Banner created.")).await?;
            Ok(banners_redirect())
        }
        Err(e) => Ok(BannerFormTemplate {
            error: Some(form_error(e)?),
            page: page(&state, &session).await?,
            banner_id: None,
            form: BannerFormView::from_upload(&form, None),
        }
        .into_response()),
    }
}

#[instrument(skip(state, session, _admin), fields(banner_id = %id))]
pub async fn edit(
    State(state): State<AppState>,
    session: AdminSession,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<BannerId>,
) -> Result<impl IntoResponse> {
    let banner = find(&state, id).await?;
    Ok(BannerFormTemplate {
        page: page(&state, &session).await?,
        banner_id: Some(id),
        form: BannerFormView::from(&banner),
        error: None,
    })
}

#[instrument(skip(state, session, _admin, multipart), fields(banner_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    session: AdminSession,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<BannerId>,
    multipart: Multipart,
) -> Result<Response> {
    let mut form = UploadForm::read(multipart).await?;
    let current = find(&state, id).await?;

    let result = match build_upload(&mut form, false) {
        Ok(upload) => {
            let credentials = session.credentials().await?;
            let result = state.backend().update_banner(&credentials, id, &upload).await;
            session.save_credentials(&credentials).await?;
            result.map_err(AppError::from)
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            session.flash(Flash::success("Banner updated.")).await?;
            Ok(banners_redirect())
        }
        Err(e) => Ok(BannerFormTemplate {
            error: Some(form_error(e)?),
            page: page(&state, &session).await?,
            banner_id: Some(id),
            form: BannerFormView::from_upload(&form, Some(current.image_url)),
        }
        .into_response()),
    }
}

#[instrument(skip(state, session, _admin), fields(banner_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    session: AdminSession,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<BannerId>,
) -> Result<Response> {
    let credentials = session.credentials().await?;
    let result = state.backend().delete_banner(&credentials, id).await;
    session.save_credentials(&credentials).await?;
    result?;

    session.flash(Flash::success("Banner deleted.")).await?;
    Ok(banners_redirect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopbag_backend::FilePart;

    use super::*;

    fn form(title: &str, order: &str, target: &str) -> UploadForm {
        let mut form = UploadForm::default();
        form.push_text("title", title);
        form.push_text("display_order", order);
        form.push_text("target_url", target);
        form
    }

    #[test]
    fn test_new_banner_needs_image() {
        let err = build_upload(&mut form("Sale", "1", ""), true).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(m) if m.contains("image")));
    }

    #[test]
    fn test_edit_keeps_image_and_drops_blank_target() {
        let upload = build_upload(&mut form("Sale", "2", " "), false).unwrap();
        assert!(upload.image.is_none());
        assert!(upload.target_url.is_none());
        assert_eq!(upload.display_order, 2);
    }

    #[test]
    fn test_target_must_be_path_or_url() {
        assert!(build_upload(&mut form("Sale", "1", "/coupons/welcome"), false).is_ok());
        assert!(build_upload(&mut form("Sale", "1", "https://shop.kr/sale"), false).is_ok());
        assert!(build_upload(&mut form("Sale", "1", "sale page"), false).is_err());
    }

    #[test]
    fn test_image_is_attached() {
        let mut form = form("Sale", "1", "");
        form.push_file(
            "image",
            FilePart {
                file_name: "b.jpg".to_string(),
                content_type: "image/jpeg".to_string(),
                bytes: vec![1],
            },
        );
        let upload = build_upload(&mut form, true).unwrap();
        assert_eq!(upload.image.unwrap().file_name, "b.jpg");
    }
}

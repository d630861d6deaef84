//! Home page: banner carousel and featured categories.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use shopbag_core::catalog::{Banner, Category, main_display, sorted_banners};
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::services::{PageContext, Visitor};
use crate::state::AppState;

/// A carousel slide.
#[derive(Clone)]
pub struct BannerView {
    pub title: String,
    pub image_url: String,
    pub link: Option<String>,
}

impl From<&Banner> for BannerView {
    fn from(banner: &Banner) -> Self {
        Self {
            title: banner.title.clone(),
            image_url: banner.image_url.clone(),
            link: banner.link().map(String::from),
        }
    }
}

#[derive(Clone)]
pub struct FeaturedCategory {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
}

impl From<&Category> for FeaturedCategory {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.to_string(),
            name: category.name.clone(),
            image_url: category.image_url.clone(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub banners: Vec<BannerView>,
    pub featured: Vec<FeaturedCategory>,
}

/// Display the home page.
///
/// Banners and categories are decoration: either failing leaves its section
/// empty instead of failing the page.
#[instrument(skip(state, visitor))]
pub async fn home(State(state): State<AppState>, visitor: Visitor) -> Result<impl IntoResponse> {
    let banners = match state.backend().banners().await {
        Ok(banners) => sorted_banners(&banners).iter().map(BannerView::from).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load banners");
            Vec::new()
        }
    };

    let featured = match state.backend().categories().await {
        Ok(categories) => main_display(&categories)
            .iter()
            .map(FeaturedCategory::from)
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load featured categories");
            Vec::new()
        }
    };

    Ok(HomeTemplate {
        page: PageContext::load(&state, &visitor).await?,
        banners,
        featured,
    })
}

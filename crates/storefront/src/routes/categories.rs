//! Category product listings.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use shopbag_backend::types::{ProductSearch, SearchScope};
use shopbag_core::catalog::{Category, children};
use shopbag_core::pagination::Pager;
use shopbag_core::types::CategoryId;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::routes::products::{PRODUCTS_PER_PAGE, ProductCard};
use crate::services::{PageContext, Visitor};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    #[serde(default)]
    pub page: u32,
}

#[derive(Template, WebTemplate)]
#[template(path = "categories/show.html")]
pub struct CategoryShowTemplate {
    pub page: PageContext,
    pub category: Category,
    /// Child categories, shown as filters on a parent's page.
    pub subcategories: Vec<Category>,
    pub products: Vec<ProductCard>,
    pub pager: Pager,
}

/// List a category's products, newest first.
///
/// The backend matches products by category name, so a parent category
/// lists what its children hold.
#[instrument(skip(state, visitor), fields(category_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    visitor: Visitor,
    Path(id): Path<CategoryId>,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse> {
    let category = state.backend().category(id).await?;
    let subcategories = match state.backend().categories().await {
        Ok(all) => children(&all, id),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load subcategories");
            Vec::new()
        }
    };

    let search = ProductSearch {
        scope: SearchScope::CategoryName,
        keyword: Some(category.name.clone()),
        page: query.page,
        size: PRODUCTS_PER_PAGE,
        ..ProductSearch::default()
    };
    let results = state.backend().search_products(&search).await?;

    Ok(CategoryShowTemplate {
        page: PageContext::load(&state, &visitor).await?,
        pager: Pager::zero_based(query.page, results.total_pages),
        products: results.content.iter().map(ProductCard::from).collect(),
        subcategories,
        category,
    })
}

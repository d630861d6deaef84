//! Product pages: detail and name search.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use shopbag_backend::types::{Product, ProductSearch, SearchScope};
use shopbag_core::pagination::Pager;
use shopbag_core::types::ProductId;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::services::{PageContext, Visitor};
use crate::state::AppState;

/// Products per listing page.
pub const PRODUCTS_PER_PAGE: u32 = 12;

/// Product card in listings.
#[derive(Clone)]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub price: String,
    pub image_url: String,
    pub sold_out: bool,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.product_name.clone(),
            price: product.price.to_string(),
            image_url: product.main_image().to_string(),
            sold_out: product.is_sold_out(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub page: u32,
}

#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: Product,
    pub in_cart: bool,
    pub cart_quantity: u32,
}

#[derive(Template, WebTemplate)]
#[template(path = "products/search.html")]
pub struct ProductSearchTemplate {
    pub page: PageContext,
    pub keyword: String,
    pub products: Vec<ProductCard>,
    pub pager: Pager,
}

/// Display a product.
#[instrument(skip(state, visitor), fields(product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    visitor: Visitor,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let product = state.backend().product(id).await?;
    let cart = visitor.cart().await?;

    Ok(ProductShowTemplate {
        page: PageContext::load(&state, &visitor).await?,
        in_cart: cart.contains(id),
        cart_quantity: cart.quantity_of(id).unwrap_or(0),
        product,
    })
}

/// Search products by name.
#[instrument(skip(state, visitor))]
pub async fn search(
    State(state): State<AppState>,
    visitor: Visitor,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse> {
    let keyword = query.keyword.trim().to_string();
    let search = ProductSearch {
        scope: SearchScope::ProductName,
        keyword: Some(keyword.clone()).filter(|k| !k.is_empty()),
        page: query.page,
        size: PRODUCTS_PER_PAGE,
        ..ProductSearch::default()
    };
    let results = state.backend().search_products(&search).await?;

    Ok(ProductSearchTemplate {
        page: PageContext::load(&state, &visitor).await?,
        pager: Pager::zero_based(query.page, results.total_pages),
        products: results.content.iter().map(ProductCard::from).collect(),
        keyword,
    })
}

//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health, /health/ready          - Health checks (in lib.rs)
//!
//! GET  /                               - Dashboard
//!
//! # Auth (backend login, ROLE_ADMIN only)
//! GET  /auth/login, POST /auth/login
//! POST /auth/logout
//!
//! # Products
//! GET  /products                       - List, search and sort (0-based pages)
//! GET  /products/new                   - Create form
//! POST /products                       - Create (multipart)
//! GET  /products/{id}/edit             - Edit form
//! POST /products/{id}                  - Update, add and delete images (multipart)
//! POST /products/{id}/delete           - Delete
//!
//! # Categories
//! GET  /categories?view=tree|order     - Tree or main display order view
//! GET  /categories/new                 - Create form
//! POST /categories                     - Create (multipart)
//! GET  /categories/{id}/edit           - Edit form
//! POST /categories/{id}                - Update (multipart)
//! POST /categories/{id}/delete         - Delete
//!
//! # Banners
//! GET  /banners, GET /banners/new, POST /banners
//! GET  /banners/{id}/edit, POST /banners/{id}, POST /banners/{id}/delete
//!
//! # Coupons
//! GET  /coupons                        - Coupon lookup
//! GET  /coupons/{id}/members           - Members who downloaded a coupon
//! ```

pub mod auth;
pub mod banners;
pub mod categories;
pub mod coupons;
pub mod dashboard;
pub mod products;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::services::uploads::MAX_UPLOAD_BYTES;
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/new", get(products::new))
        .route("/{id}", post(products::update))
        .route("/{id}/edit", get(products::edit))
        .route("/{id}/delete", post(products::delete))
}

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route("/new", get(categories::new))
        .route("/{id}", post(categories::update))
        .route("/{id}/edit", get(categories::edit))
        .route("/{id}/delete", post(categories::delete))
}

pub fn banner_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(banners::index).post(banners::create))
        .route("/new", get(banners::new))
        .route("/{id}", post(banners::update))
        .route("/{id}/edit", get(banners::edit))
        .route("/{id}/delete", post(banners::delete))
}

pub fn coupon_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(coupons::index))
        .route("/{id}/members", get(coupons::members))
}

/// Every console route.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::dashboard))
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .nest("/banners", banner_routes())
        .nest("/coupons", coupon_routes())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Home (banners, featured categories)
//! GET  /products                      - Product name search
//! GET  /products/{id}                 - Product detail
//! GET  /categories/{id}               - Category product listing
//!
//! # Cart
//! GET  /cart                          - Cart page
//! POST /cart/add                      - Add a product
//! POST /cart/update                   - Change a quantity
//! POST /cart/remove                   - Remove a product
//! POST /cart/remove-selected          - Remove selected products
//! POST /cart/clear                    - Empty the cart
//! POST /cart/select                   - Toggle a line's selection
//! POST /cart/select-all               - Toggle every line
//! GET  /cart/coupons/{product_id}     - Coupon picker (login required)
//! POST /cart/coupons/{product_id}     - Apply a coupon
//! POST /cart/coupons/{product_id}/remove - Remove the coupon
//! POST /cart/checkout                 - Build the order draft
//!
//! # Orders (login required)
//! GET  /order                         - Order form
//! POST /order                         - Place the order
//! GET  /orders/{id}                   - Order detail
//!
//! # Coupons
//! GET  /coupons                       - Member coupons (login required)
//! POST /coupons/register              - Register a code (login required)
//! GET  /coupons/welcome               - Welcome coupons
//! POST /coupons/welcome/download      - Download a welcome coupon
//! GET  /coupons/{id}/order            - Order a used coupon went to
//!
//! # Account (login required)
//! GET  /account                       - Overview
//! GET  /account/addresses             - Address book
//! GET  /account/addresses/new         - New address form
//! POST /account/addresses             - Save a new address
//! GET  /account/addresses/{id}/edit   - Edit form
//! POST /account/addresses/{id}        - Update an address
//! POST /account/addresses/{id}/delete - Delete an address
//!
//! # Auth
//! GET  /auth/login, POST /auth/login
//! GET  /auth/signup, POST /auth/signup
//! POST /auth/logout
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod coupons;
pub mod home;
pub mod order;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{auth_rate_limiter, coupon_rate_limiter};
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .layer(auth_rate_limiter())
        .route("/logout", post(auth::logout))
}

pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/remove-selected", post(cart::remove_selected))
        .route("/clear", post(cart::clear))
        .route("/select", post(cart::select))
        .route("/select-all", post(cart::select_all))
        .route(
            "/coupons/{product_id}",
            get(cart::coupon_picker).post(cart::apply_coupon),
        )
        .route("/coupons/{product_id}/remove", post(cart::remove_coupon))
        .route("/checkout", post(cart::checkout))
}

pub fn coupon_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(coupons::register))
        .route("/welcome/download", post(coupons::download))
        .layer(coupon_rate_limiter())
        .route("/", get(coupons::index))
        .route("/welcome", get(coupons::welcome))
        .route("/{id}/order", get(coupons::order))
}

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route(
            "/addresses",
            get(account::addresses).post(account::create_address),
        )
        .route("/addresses/new", get(account::new_address))
        .route("/addresses/{id}", post(account::update_address))
        .route("/addresses/{id}/edit", get(account::edit_address))
        .route("/addresses/{id}/delete", post(account::delete_address))
}

/// Every storefront route.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/products", get(products::search))
        .route("/products/{id}", get(products::show))
        .route("/categories/{id}", get(categories::show))
        .nest("/cart", cart_routes())
        .route("/order", get(order::new).post(order::create))
        .route("/orders/{id}", get(order::show))
        .nest("/coupons", coupon_routes())
        .nest("/account", account_routes())
        .nest("/auth", auth_routes())
}

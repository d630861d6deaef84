//! Cart page and cart mutations.
//!
//! The cart lives in the session. Every mutation rewrites it, drops selection
//! state for products that left, mirrors the change to the backend for
//! members, and redirects back to `/cart` (post/redirect/get).

use std::borrow::Borrow;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use futures::future::join_all;
use serde::Deserialize;
use shopbag_backend::BackendError;
use shopbag_backend::types::{ApplicableCoupon, Product};
use shopbag_core::cart::{CartError, LocalCart};
use shopbag_core::checkout::{CheckoutLine, CheckoutSelection, CheckoutTotals, CouponChoice};
use shopbag_core::types::{CouponMemberId, ProductId, Won};
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::middleware::auth::login_url;
use crate::models::Flash;
use crate::services::{PageContext, Visitor, cart_sync};
use crate::state::AppState;

/// One cart row as rendered.
#[derive(Clone)]
pub struct CartLineView {
    pub product_id: String,
    pub name: String,
    pub image_url: String,
    pub unit_price: Won,
    pub quantity: u32,
    pub stock: u32,
    pub sold_out: bool,
    pub selected: bool,
    pub coupon_name: Option<String>,
    pub discount: Won,
    pub line_total: Won,
}

/// A cart line with the product it prices.
struct PricedLine {
    product: Product,
    line: CheckoutLine,
}

#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
    /// Set by the "buy now" button.
    #[serde(default)]
    pub buy_now: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityForm {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub product_id: ProductId,
}

#[derive(Debug, Deserialize)]
pub struct ApplyCouponForm {
    pub coupon_member_id: CouponMemberId,
}

#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub lines: Vec<CartLineView>,
    pub all_selected: bool,
    pub totals: CheckoutTotals,
}

#[derive(Template, WebTemplate)]
#[template(path = "cart/coupons.html")]
pub struct CouponPickerTemplate {
    pub page: PageContext,
    pub product: Product,
    pub unit_price: Won,
    pub coupons: Vec<ApplicableCoupon>,
    pub applied: Option<CouponMemberId>,
}

impl CouponPickerTemplate {
    fn is_applied(&self, id: impl Borrow<CouponMemberId>) -> bool {
        self.applied == Some(*id.borrow())
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Price every cart line concurrently.
///
/// Products the backend no longer knows are dropped from the cart.
async fn price_cart(state: &AppState, visitor: &Visitor) -> Result<Vec<PricedLine>> {
    let mut cart = visitor.cart().await?;
    let fetches = cart
        .items()
        .iter()
        .map(|item| state.backend().product(item.id));
    let results = join_all(fetches).await;

    let mut lines = Vec::with_capacity(results.len());
    let mut missing = Vec::new();
    for (item, result) in cart.items().iter().zip(results) {
        match result {
            Ok(product) => lines.push(PricedLine {
                line: product.checkout_line(item.quantity),
                product,
            }),
            Err(BackendError::NotFound(_)) => missing.push(item.id),
            Err(e) => return Err(e.into()),
        }
    }

    if !missing.is_empty() {
        tracing::info!(count = missing.len(), "Dropping discontinued products from cart");
        cart.remove_many(&missing);
        save_cart(state, visitor, &cart).await?;
        visitor
            .flash(Flash::info("Some products are no longer sold and were removed."))
            .await?;
    }
    Ok(lines)
}

fn checkout_lines(priced: &[PricedLine]) -> Vec<CheckoutLine> {
    priced.iter().map(|p| p.line.clone()).collect()
}

/// Persist the cart, prune the selection to match, and mirror to the backend.
async fn save_cart(state: &AppState, visitor: &Visitor, cart: &LocalCart) -> Result<()> {
    visitor.set_cart(cart).await?;
    let mut selection = visitor.selection().await?;
    selection.retain_cart(cart);
    visitor.set_selection(&selection).await?;
    cart_sync::sync(state.backend(), visitor).await
}

async fn priced_line(state: &AppState, visitor: &Visitor, id: ProductId) -> Result<CheckoutLine> {
    let cart = visitor.cart().await?;
    let quantity = cart
        .quantity_of(id)
        .ok_or_else(|| AppError::NotFound(format!("product {id} in cart")))?;
    let product = state.backend().product(id).await?;
    Ok(product.checkout_line(quantity))
}

fn cart_redirect() -> Response {
    Redirect::to("/cart").into_response()
}

fn line_view(priced: &PricedLine, selection: &CheckoutSelection) -> CartLineView {
    let line = &priced.line;
    let coupon = selection.coupon_for(line.product_id);
    let discount = coupon.map_or(Won::ZERO, |c| c.discount_for(line.unit_price));
    CartLineView {
        product_id: line.product_id.to_string(),
        name: line.name.clone(),
        image_url: priced.product.main_image().to_string(),
        unit_price: line.unit_price,
        quantity: line.quantity,
        stock: line.stock,
        sold_out: !line.in_stock(),
        selected: selection.is_selected(line.product_id),
        coupon_name: coupon.map(|c| c.name.clone()),
        discount,
        line_total: line.original_total() - discount,
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart with selection, coupons and totals.
#[instrument(skip(state, visitor))]
pub async fn show(State(state): State<AppState>, visitor: Visitor) -> Result<impl IntoResponse> {
    let priced = price_cart(&state, &visitor).await?;
    let lines = checkout_lines(&priced);

    let mut selection = visitor.selection().await?;
    selection.retain_cart(&visitor.cart().await?);
    selection.retain_in_stock(&lines);
    visitor.set_selection(&selection).await?;

    let in_stock = lines.iter().filter(|l| l.in_stock()).count();
    Ok(CartShowTemplate {
        page: PageContext::load(&state, &visitor).await?,
        lines: priced.iter().map(|p| line_view(p, &selection)).collect(),
        all_selected: in_stock > 0 && selection.selected().len() == in_stock,
        totals: selection.totals(&lines),
    })
}

/// Add a product to the cart.
///
/// The quantity defaults to 1 and may not exceed the stock.
#[instrument(skip(state, visitor))]
pub async fn add(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product = state.backend().product(form.product_id).await?;
    let back = format!("/products/{}", form.product_id);

    if product.is_sold_out() {
        visitor.flash(Flash::error("This product is sold out.")).await?;
        return Ok(Redirect::to(&back).into_response());
    }
    let quantity = form.quantity.unwrap_or(1);
    if quantity > product.stock {
        visitor
            .flash(Flash::error(format!(
                "Only {} left in stock.",
                product.stock
            )))
            .await?;
        return Ok(Redirect::to(&back).into_response());
    }

    let mut cart = visitor.cart().await?;
    match cart.add(form.product_id, Some(quantity)) {
        Ok(()) => {
            save_cart(&state, &visitor, &cart).await?;
            add_breadcrumb("cart", "Added product", None);
            visitor
                .flash(Flash::success(format!(
                    "{} was added to your cart.",
                    product.product_name
                )))
                .await?;
        }
        Err(CartError::AlreadyInCart(_)) => {
            visitor
                .flash(Flash::info("This product is already in your cart."))
                .await?;
        }
        Err(e) => {
            visitor.flash(Flash::error(e.to_string())).await?;
            return Ok(Redirect::to(&back).into_response());
        }
    }

    if form.buy_now.is_some() {
        Ok(cart_redirect())
    } else {
        Ok(Redirect::to(&back).into_response())
    }
}

/// Change a line's quantity, bounded by stock.
#[instrument(skip(state, visitor))]
pub async fn update(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<UpdateQuantityForm>,
) -> Result<Response> {
    let product = state.backend().product(form.product_id).await?;
    if form.quantity > product.stock {
        visitor
            .flash(Flash::error(format!(
                "Only {} of {} left in stock.",
                product.stock, product.product_name
            )))
            .await?;
        return Ok(cart_redirect());
    }

    let mut cart = visitor.cart().await?;
    if let Err(e) = cart.update_quantity(form.product_id, form.quantity) {
        visitor.flash(Flash::error(e.to_string())).await?;
        return Ok(cart_redirect());
    }
    save_cart(&state, &visitor, &cart).await?;
    Ok(cart_redirect())
}

/// Remove one product.
#[instrument(skip(state, visitor))]
pub async fn remove(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let mut cart = visitor.cart().await?;
    if cart.remove(form.product_id) {
        save_cart(&state, &visitor, &cart).await?;
    }
    Ok(cart_redirect())
}

/// Remove every selected product.
#[instrument(skip(state, visitor))]
pub async fn remove_selected(State(state): State<AppState>, visitor: Visitor) -> Result<Response> {
    let selection = visitor.selection().await?;
    if selection.selected().is_empty() {
        visitor
            .flash(Flash::info("Select the products to remove first."))
            .await?;
        return Ok(cart_redirect());
    }

    let mut cart = visitor.cart().await?;
    cart.remove_many(selection.selected());
    save_cart(&state, &visitor, &cart).await?;
    Ok(cart_redirect())
}

/// Empty the cart.
#[instrument(skip(state, visitor))]
pub async fn clear(State(state): State<AppState>, visitor: Visitor) -> Result<Response> {
    visitor.set_selection(&CheckoutSelection::new()).await?;
    cart_sync::clear(state.backend(), &visitor).await?;
    Ok(cart_redirect())
}

/// Toggle one line's selection.
#[instrument(skip(state, visitor))]
pub async fn select(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let line = priced_line(&state, &visitor, form.product_id).await?;
    let mut selection = visitor.selection().await?;
    if let Err(e) = selection.toggle(&line) {
        visitor.flash(Flash::error(e.to_string())).await?;
    }
    visitor.set_selection(&selection).await?;
    Ok(cart_redirect())
}

/// Select every in-stock line, or clear the selection if all are selected.
#[instrument(skip(state, visitor))]
pub async fn select_all(State(state): State<AppState>, visitor: Visitor) -> Result<Response> {
    let priced = price_cart(&state, &visitor).await?;
    let mut selection = visitor.selection().await?;
    selection.toggle_all(&checkout_lines(&priced));
    visitor.set_selection(&selection).await?;
    Ok(cart_redirect())
}

/// List the member's coupons usable on a cart product.
#[instrument(skip(state, visitor, _user), fields(product_id = %id))]
pub async fn coupon_picker(
    State(state): State<AppState>,
    visitor: Visitor,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    if !visitor.cart().await?.contains(id) {
        return Ok(cart_redirect());
    }

    let credentials = visitor.credentials().await?;
    let coupons = state.backend().applicable_coupons(&credentials, id).await;
    visitor.save_credentials(&credentials).await?;
    let coupons = coupons?;
    let product = state.backend().product(id).await?;
    let applied = visitor
        .selection()
        .await?
        .coupon_for(id)
        .map(|c| c.coupon_member_id);

    Ok(CouponPickerTemplate {
        page: PageContext::load(&state, &visitor).await?,
        unit_price: product.price,
        product,
        coupons,
        applied,
    }
    .into_response())
}

/// Put a coupon on a cart product.
///
/// The coupon is looked up again so only coupons the backend offers for this
/// product can be applied.
#[instrument(skip(state, visitor, _user), fields(product_id = %id))]
pub async fn apply_coupon(
    State(state): State<AppState>,
    visitor: Visitor,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<ProductId>,
    Form(form): Form<ApplyCouponForm>,
) -> Result<Response> {
    let credentials = visitor.credentials().await?;
    let offered = state.backend().applicable_coupons(&credentials, id).await;
    visitor.save_credentials(&credentials).await?;

    let Some(coupon) = offered?
        .into_iter()
        .find(|c| c.coupon_member_id == form.coupon_member_id)
    else {
        visitor
            .flash(Flash::error("That coupon cannot be used on this product."))
            .await?;
        return Ok(cart_redirect());
    };

    let line = priced_line(&state, &visitor, id).await?;
    let mut selection = visitor.selection().await?;
    match selection.apply_coupon(&line, CouponChoice::from(coupon)) {
        Ok(notices) => {
            for notice in notices {
                visitor.flash(Flash::info(notice.to_string())).await?;
            }
            visitor.flash(Flash::success("Coupon applied.")).await?;
            let product_id = id.to_string();
            add_breadcrumb(
                "cart",
                "Applied coupon",
                Some(&[("product_id", product_id.as_str())]),
            );
        }
        Err(e) => visitor.flash(Flash::error(e.to_string())).await?,
    }
    visitor.set_selection(&selection).await?;
    Ok(cart_redirect())
}

/// Take the coupon off a cart product.
#[instrument(skip(visitor), fields(product_id = %id))]
pub async fn remove_coupon(visitor: Visitor, Path(id): Path<ProductId>) -> Result<Response> {
    let mut selection = visitor.selection().await?;
    if selection.remove_coupon(id) {
        visitor.set_selection(&selection).await?;
    }
    Ok(cart_redirect())
}

/// Turn the selection into an order draft and continue to the order page.
///
/// Guests are sent to log in and come back to the cart.
#[instrument(skip(state, visitor))]
pub async fn checkout(State(state): State<AppState>, visitor: Visitor) -> Result<Response> {
    if visitor.current_user().await?.is_none() {
        visitor
            .flash(Flash::info("Log in to place an order."))
            .await?;
        return Ok(Redirect::to(&login_url("/cart")).into_response());
    }

    let priced = price_cart(&state, &visitor).await?;
    let lines = checkout_lines(&priced);
    let mut selection = visitor.selection().await?;
    selection.retain_in_stock(&lines);
    visitor.set_selection(&selection).await?;

    match selection.build_order(&lines) {
        Ok(draft) => {
            visitor.set_order_draft(&draft).await?;
            Ok(Redirect::to("/order").into_response())
        }
        Err(e) => {
            visitor.flash(Flash::error(e.to_string())).await?;
            Ok(cart_redirect())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn priced(id: i64, price: i64, quantity: u32, stock: u32) -> PricedLine {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": id,
            "productName": format!("Product {id}"),
            "price": price,
            "stock": stock,
        }))
        .unwrap();
        PricedLine {
            line: product.checkout_line(quantity),
            product,
        }
    }

    #[test]
    fn test_line_view_applies_coupon_discount() {
        let line = priced(1, 10_000, 2, 5);
        let mut selection = CheckoutSelection::new();
        selection
            .apply_coupon(
                &line.line,
                CouponChoice {
                    coupon_member_id: CouponMemberId::new(7),
                    name: "1000 off".to_string(),
                    kind: shopbag_core::types::CouponKind::Amount,
                    value: 1_000,
                    percentage: 0,
                },
            )
            .unwrap();

        let view = line_view(&line, &selection);
        assert!(view.selected);
        assert_eq!(view.discount, Won::new(1_000));
        assert_eq!(view.line_total, Won::new(19_000));
        assert_eq!(view.coupon_name.as_deref(), Some("1000 off"));
    }

    #[test]
    fn test_line_view_marks_sold_out() {
        let line = priced(2, 3_000, 1, 0);
        let view = line_view(&line, &CheckoutSelection::new());
        assert!(view.sold_out);
        assert!(!view.selected);
        assert_eq!(view.line_total, Won::new(3_000));
    }
}

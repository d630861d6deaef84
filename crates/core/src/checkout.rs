//! Checkout rules: which cart lines are selected, which coupon sits on which
//! product, and what the visitor pays.
//!
//! A coupon issued to a member (`CouponMemberId`) can sit on at most one
//! product, and a product carries at most one coupon. Only selected, in-stock
//! lines count toward totals and orders.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::cart::LocalCart;
use crate::types::{CouponKind, CouponMemberId, ProductId, Won};

/// Orders below this subtotal pay [`SHIPPING_FEE`].
pub const FREE_SHIPPING_THRESHOLD: Won = Won::new(20_000);
/// Flat delivery fee.
pub const SHIPPING_FEE: Won = Won::new(2_500);

/// A member coupon the visitor picked for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponChoice {
    pub coupon_member_id: CouponMemberId,
    pub name: String,
    pub kind: CouponKind,
    /// Amount off for `Amount` coupons.
    pub value: i64,
    /// Percent off for `Percentage` coupons.
    pub percentage: i64,
}

impl CouponChoice {
    /// Discount for one product line, never more than the unit price.
    #[must_use]
    pub fn discount_for(&self, unit_price: Won) -> Won {
        let raw = match self.kind {
            CouponKind::Amount => self.value,
            CouponKind::Percentage => {
                unit_price.amount().saturating_mul(self.percentage) / 100
            }
        };
        Won::new(raw.max(0)).min(unit_price)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedCoupon {
    pub product_id: ProductId,
    pub coupon: CouponChoice,
}

/// Side effects of applying a coupon that the visitor should be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponNotice {
    /// The coupon was taken off another product first.
    MovedFromOtherProduct { from: ProductId, coupon_name: String },
    /// The product's previous coupon was replaced.
    Replaced { previous: String },
}

impl fmt::Display for CouponNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MovedFromOtherProduct { coupon_name, .. } => write!(
                f,
                "\"{coupon_name}\" was removed from another product and applied here."
            ),
            Self::Replaced { previous } => {
                write!(f, "\"{previous}\" was replaced with the new coupon.")
            }
        }
    }
}

/// Product details needed to price a cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Won,
    pub quantity: u32,
    pub stock: u32,
}

impl CheckoutLine {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    #[must_use]
    pub fn original_total(&self) -> Won {
        self.unit_price.times(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockShortage {
    pub name: String,
    pub requested: u32,
    pub stock: u32,
}

impl fmt::Display for StockShortage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (requested: {}, stock: {})",
            self.name, self.requested, self.stock
        )
    }
}

fn format_shortages(shortages: &[StockShortage]) -> String {
    shortages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("select at least one product to order")]
    NothingSelected,
    #[error("product {0} is out of stock")]
    OutOfStock(ProductId),
    #[error("not enough stock: {}", format_shortages(.0))]
    InsufficientStock(Vec<StockShortage>),
}

/// Amounts shown under the cart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckoutTotals {
    /// Price times quantity over selected lines, before coupons.
    pub subtotal: Won,
    pub discount: Won,
    /// Subtotal minus discount.
    pub total: Won,
    pub shipping: Won,
    /// Total plus shipping.
    pub payment: Won,
}

/// Delivery fee for a selection.
#[must_use]
pub fn shipping_fee(selected_lines: usize, subtotal: Won) -> Won {
    if selected_lines == 0 || subtotal >= FREE_SHIPPING_THRESHOLD {
        Won::ZERO
    } else {
        SHIPPING_FEE
    }
}

/// Selected products and the coupons attached to them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSelection {
    selected: Vec<ProductId>,
    coupons: Vec<AppliedCoupon>,
}

impl CheckoutSelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_selected(&self, id: ProductId) -> bool {
        self.selected.contains(&id)
    }

    #[must_use]
    pub fn selected(&self) -> &[ProductId] {
        &self.selected
    }

    #[must_use]
    pub fn coupons(&self) -> &[AppliedCoupon] {
        &self.coupons
    }

    #[must_use]
    pub fn coupon_for(&self, id: ProductId) -> Option<&CouponChoice> {
        self.coupons
            .iter()
            .find(|applied| applied.product_id == id)
            .map(|applied| &applied.coupon)
    }

    /// Select a line.
    ///
    /// # Errors
    ///
    /// Returns `OutOfStock` when the product has no stock.
    pub fn select(&mut self, line: &CheckoutLine) -> Result<(), CheckoutError> {
        if !line.in_stock() {
            return Err(CheckoutError::OutOfStock(line.product_id));
        }
        if !self.is_selected(line.product_id) {
            self.selected.push(line.product_id);
        }
        Ok(())
    }

    /// Deselect a product and drop its coupon.
    pub fn deselect(&mut self, id: ProductId) {
        self.selected.retain(|selected| *selected != id);
        self.remove_coupon(id);
    }

    /// Flip one line's selection.
    ///
    /// # Errors
    ///
    /// Returns `OutOfStock` when selecting a product with no stock.
    pub fn toggle(&mut self, line: &CheckoutLine) -> Result<(), CheckoutError> {
        if self.is_selected(line.product_id) {
            self.deselect(line.product_id);
            Ok(())
        } else {
            self.select(line)
        }
    }

    /// Select every in-stock line, or clear everything when they are all
    /// selected already.
    pub fn toggle_all(&mut self, lines: &[CheckoutLine]) {
        let in_stock: Vec<ProductId> = lines
            .iter()
            .filter(|line| line.in_stock())
            .map(|line| line.product_id)
            .collect();
        let all_selected = !in_stock.is_empty() && in_stock.iter().all(|id| self.is_selected(*id));
        if all_selected {
            self.selected.clear();
            self.coupons.clear();
        } else {
            for id in in_stock {
                if !self.is_selected(id) {
                    self.selected.push(id);
                }
            }
        }
    }

    /// Attach a coupon to a line and select it.
    ///
    /// The coupon leaves any other product it was on, and the line's previous
    /// coupon is dropped.
    ///
    /// # Errors
    ///
    /// Returns `OutOfStock` when the product has no stock.
    pub fn apply_coupon(
        &mut self,
        line: &CheckoutLine,
        coupon: CouponChoice,
    ) -> Result<Vec<CouponNotice>, CheckoutError> {
        if !line.in_stock() {
            return Err(CheckoutError::OutOfStock(line.product_id));
        }

        let mut notices = Vec::new();
        if let Some(position) = self.coupons.iter().position(|applied| {
            applied.coupon.coupon_member_id == coupon.coupon_member_id
                && applied.product_id != line.product_id
        }) {
            let moved = self.coupons.remove(position);
            notices.push(CouponNotice::MovedFromOtherProduct {
                from: moved.product_id,
                coupon_name: moved.coupon.name,
            });
        }

        if let Some(position) = self
            .coupons
            .iter()
            .position(|applied| applied.product_id == line.product_id)
        {
            let previous = self.coupons.remove(position);
            if previous.coupon.coupon_member_id != coupon.coupon_member_id {
                notices.push(CouponNotice::Replaced {
                    previous: previous.coupon.name,
                });
            }
        }

        self.coupons.push(AppliedCoupon {
            product_id: line.product_id,
            coupon,
        });
        self.select(line)?;
        Ok(notices)
    }

    /// Returns whether a coupon was removed.
    pub fn remove_coupon(&mut self, id: ProductId) -> bool {
        let before = self.coupons.len();
        self.coupons.retain(|applied| applied.product_id != id);
        self.coupons.len() != before
    }

    /// Drop selection and coupons for products that left the cart.
    pub fn retain_cart(&mut self, cart: &LocalCart) {
        self.selected.retain(|id| cart.contains(*id));
        self.coupons.retain(|applied| cart.contains(applied.product_id));
    }

    /// Drop selection and coupons for lines that ran out of stock.
    pub fn retain_in_stock(&mut self, lines: &[CheckoutLine]) {
        let sold_out: Vec<ProductId> = lines
            .iter()
            .filter(|line| !line.in_stock())
            .map(|line| line.product_id)
            .collect();
        for id in sold_out {
            self.deselect(id);
        }
    }

    fn line_discount(&self, line: &CheckoutLine) -> Won {
        self.coupon_for(line.product_id)
            .map_or(Won::ZERO, |coupon| coupon.discount_for(line.unit_price))
    }

    fn selected_lines<'a>(
        &'a self,
        lines: &'a [CheckoutLine],
    ) -> impl Iterator<Item = &'a CheckoutLine> + 'a {
        lines
            .iter()
            .filter(|line| line.in_stock() && self.is_selected(line.product_id))
    }

    #[must_use]
    pub fn totals(&self, lines: &[CheckoutLine]) -> CheckoutTotals {
        let selected: Vec<&CheckoutLine> = self.selected_lines(lines).collect();
        let subtotal: Won = selected.iter().map(|line| line.original_total()).sum();
        let discount: Won = selected.iter().map(|line| self.line_discount(line)).sum();
        let total = subtotal - discount;
        let shipping = shipping_fee(selected.len(), subtotal);
        CheckoutTotals {
            subtotal,
            discount,
            total,
            shipping,
            payment: total + shipping,
        }
    }

    /// Turn the selected lines into an order draft.
    ///
    /// # Errors
    ///
    /// Returns `NothingSelected` for an empty selection and
    /// `InsufficientStock` listing every line that asks for more than is
    /// available.
    pub fn build_order(&self, lines: &[CheckoutLine]) -> Result<OrderDraft, CheckoutError> {
        let selected: Vec<&CheckoutLine> = self.selected_lines(lines).collect();
        if selected.is_empty() {
            return Err(CheckoutError::NothingSelected);
        }

        let shortages: Vec<StockShortage> = selected
            .iter()
            .filter(|line| line.quantity > line.stock)
            .map(|line| StockShortage {
                name: line.name.clone(),
                requested: line.quantity,
                stock: line.stock,
            })
            .collect();
        if !shortages.is_empty() {
            return Err(CheckoutError::InsufficientStock(shortages));
        }

        let order_lines = selected
            .iter()
            .map(|line| {
                let original = line.original_total();
                let coupon = self.coupon_for(line.product_id);
                OrderLine {
                    product_id: line.product_id,
                    product_name: line.name.clone(),
                    quantity: line.quantity,
                    item_price: line.unit_price,
                    original_total_price: original,
                    discounted_total_price: original - self.line_discount(line),
                    coupon_name: coupon.map(|c| c.name.clone()),
                    coupon_member_id: coupon.map(|c| c.coupon_member_id),
                }
            })
            .collect();

        Ok(OrderDraft {
            lines: order_lines,
            shipping_cost: self.totals(lines).shipping,
        })
    }
}

/// One line of an order, in the shape the order API expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub item_price: Won,
    pub original_total_price: Won,
    pub discounted_total_price: Won,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_member_id: Option<CouponMemberId>,
}

/// Lines chosen for ordering, carried from the cart to the order page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub lines: Vec<OrderLine>,
    pub shipping_cost: Won,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSummary {
    pub original_total: Won,
    pub discounted_total: Won,
    pub discount: Won,
    pub delivery_fee: Won,
    pub payment: Won,
}

impl OrderDraft {
    #[must_use]
    pub fn summary(&self) -> OrderSummary {
        let original_total: Won = self.lines.iter().map(|l| l.original_total_price).sum();
        let discounted_total: Won = self.lines.iter().map(|l| l.discounted_total_price).sum();
        OrderSummary {
            original_total,
            discounted_total,
            discount: original_total - discounted_total,
            delivery_fee: self.shipping_cost,
            payment: discounted_total + self.shipping_cost,
        }
    }

    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.lines.iter().map(|line| line.product_id).collect()
    }
}

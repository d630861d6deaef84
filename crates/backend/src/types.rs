//! Request and response shapes of the backend API.
//!
//! Field names follow the backend's camelCase JSON. Lists the backend may
//! omit default to empty so a partial payload still renders.

use serde::{Deserialize, Deserializer, Serialize};
use shopbag_core::cart::CartItem;
use shopbag_core::checkout::{CheckoutLine, CouponChoice, OrderLine};
use shopbag_core::types::{
    AddressId, CouponId, CouponKind, CouponMemberId, DeliveryPhone, OrderId, ProductId, Won, YesNo,
};

/// Image shown when a product has none.
pub const FALLBACK_IMAGE: &str = "/static/img/placeholder.svg";

/// Saved addresses allowed per member.
pub const MAX_ADDRESSES: usize = 5;

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub product_name: String,
    pub price: Won,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub sold_out: bool,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub product_img_urls: Vec<String>,
    #[serde(default)]
    pub product_desc_img_urls: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Product {
    /// First product image or the placeholder.
    #[must_use]
    pub fn main_image(&self) -> &str {
        self.product_img_urls
            .first()
            .map_or(FALLBACK_IMAGE, String::as_str)
    }

    #[must_use]
    pub const fn is_sold_out(&self) -> bool {
        self.sold_out || self.stock == 0
    }

    /// Price this product for a cart line.
    #[must_use]
    pub fn checkout_line(&self, quantity: u32) -> CheckoutLine {
        CheckoutLine {
            product_id: self.id,
            name: self.product_name.clone(),
            unit_price: self.price,
            quantity,
            stock: if self.sold_out { 0 } else { self.stock },
        }
    }
}

/// One page of a product search (0-based).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    #[serde(default)]
    pub content: Vec<Product>,
    #[serde(default)]
    pub total_pages: u32,
}

/// Which product search endpoint to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchScope {
    /// Keyword matches the product name.
    #[default]
    ProductName,
    /// Keyword matches the category name.
    CategoryName,
}

impl SearchScope {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::ProductName => "/api/products",
            Self::CategoryName => "/api/products/byCategory",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    #[default]
    Desc,
}

impl SortDir {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Product search parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSearch {
    pub scope: SearchScope,
    pub keyword: Option<String>,
    pub page: u32,
    pub size: u32,
    pub sort_field: String,
    pub sort_dir: SortDir,
}

impl Default for ProductSearch {
    fn default() -> Self {
        Self {
            scope: SearchScope::ProductName,
            keyword: None,
            page: 0,
            size: 10,
            sort_field: "createdAt".to_string(),
            sort_dir: SortDir::Desc,
        }
    }
}

// =============================================================================
// Carts
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl From<ServerCartItem> for CartItem {
    fn from(item: ServerCartItem) -> Self {
        Self::new(item.product_id, item.quantity)
    }
}

impl From<CartItem> for ServerCartItem {
    fn from(item: CartItem) -> Self {
        Self {
            product_id: item.id,
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerCart {
    #[serde(default)]
    pub carts: Vec<ServerCartItem>,
}

// =============================================================================
// Addresses
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub address_id: AddressId,
    pub postal_code: String,
    pub delivery_address: String,
    #[serde(default)]
    pub detailed_address: String,
    pub delivery_receiver: String,
    pub delivery_phone: String,
    #[serde(default)]
    pub delivery_memo: Option<String>,
    #[serde(default)]
    pub default_address: YesNo,
}

impl Address {
    #[must_use]
    pub const fn is_default(&self) -> bool {
        self.default_address.is_yes()
    }

    /// Same delivery details, ignoring the default flag.
    #[must_use]
    pub fn matches(&self, input: &AddressInput) -> bool {
        self.postal_code == input.postal_code
            && self.delivery_address == input.delivery_address
            && self.detailed_address == input.detailed_address
            && self.delivery_receiver == input.delivery_receiver
            && self.delivery_phone == input.delivery_phone.to_string()
            && self.delivery_memo.as_deref().unwrap_or("") == input.delivery_memo
    }
}

/// Address fields as submitted from a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub postal_code: String,
    pub delivery_address: String,
    pub detailed_address: String,
    pub delivery_receiver: String,
    pub delivery_phone: DeliveryPhone,
    pub delivery_memo: String,
    pub default_address: YesNo,
}

// =============================================================================
// Coupons
// =============================================================================

/// A coupon held by the member.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberCoupon {
    pub id: CouponId,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(rename = "type")]
    pub kind: CouponKind,
    #[serde(default)]
    pub value: i64,
    #[serde(default)]
    pub percentage: i64,
    #[serde(default)]
    pub min_value: i64,
    #[serde(default)]
    pub expired_at: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub used: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponPage {
    #[serde(default)]
    pub coupons: Vec<MemberCoupon>,
    #[serde(default)]
    pub total_pages: u32,
}

/// A member coupon usable on a given product.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicableCoupon {
    pub coupon_member_id: CouponMemberId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CouponKind,
    #[serde(default)]
    pub value: i64,
    #[serde(default)]
    pub percentage: i64,
    #[serde(default)]
    pub min_value: Option<i64>,
    #[serde(default)]
    pub expired_at: Option<String>,
}

impl From<ApplicableCoupon> for CouponChoice {
    fn from(coupon: ApplicableCoupon) -> Self {
        Self {
            coupon_member_id: coupon.coupon_member_id,
            name: coupon.name,
            kind: coupon.kind,
            value: coupon.value,
            percentage: coupon.percentage,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicableCoupons {
    #[serde(default)]
    pub coupons: Vec<ApplicableCoupon>,
}

/// A coupon anyone can download.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeCoupon {
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CouponKind,
    #[serde(default)]
    pub value: i64,
    #[serde(default)]
    pub percentage: i64,
    #[serde(default)]
    pub min_value: i64,
    #[serde(default)]
    pub expired_at: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WelcomeCoupons {
    #[serde(default)]
    pub coupons: Vec<WelcomeCoupon>,
}

/// Member who downloaded a coupon (admin view).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponMember {
    pub user_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponMemberPage {
    #[serde(default)]
    pub members: Vec<CouponMember>,
    #[serde(default)]
    pub total_pages: u32,
}

// =============================================================================
// Orders
// =============================================================================

/// Body of `POST /api/order`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_id: Option<AddressId>,
    #[serde(flatten)]
    pub delivery: AddressInput,
    pub order_items: Vec<OrderLine>,
    pub delivery_fee: Won,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    #[serde(deserialize_with = "lenient_id")]
    pub order_id: OrderId,
}

/// One ordered item as reported back by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedItem {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub item_price: Won,
    #[serde(default)]
    pub original_total_price: Won,
    #[serde(default)]
    pub discounted_total_price: Won,
    #[serde(default)]
    pub coupon_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(alias = "id", deserialize_with = "lenient_id")]
    pub order_id: OrderId,
    #[serde(default)]
    pub order_status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub delivery_address: String,
    #[serde(default)]
    pub detailed_address: String,
    #[serde(default)]
    pub delivery_receiver: String,
    #[serde(default)]
    pub delivery_phone: String,
    #[serde(default)]
    pub delivery_memo: Option<String>,
    #[serde(default)]
    pub delivery_fee: Won,
    #[serde(default)]
    pub order_items: Vec<OrderedItem>,
}

impl OrderDetail {
    #[must_use]
    pub fn items_total(&self) -> Won {
        self.order_items
            .iter()
            .map(|item| item.discounted_total_price)
            .sum()
    }

    #[must_use]
    pub fn payment(&self) -> Won {
        self.items_total() + self.delivery_fee
    }
}

/// Accept an ID sent either as a number or as a numeric string.
pub(crate) fn lenient_id<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<i64>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(T::from(n)),
        Raw::Text(s) => s
            .trim()
            .trim_matches('"')
            .parse::<i64>()
            .map(T::from)
            .map_err(serde::de::Error::custom),
    }
}

//! Order page, order submission and order detail.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use shopbag_backend::types::{Address, AddressInput, MAX_ADDRESSES, OrderDetail, OrderRequest};
use shopbag_backend::{BackendClient, BackendError, Credentials};
use shopbag_core::cart::retain_unordered;
use shopbag_core::checkout::{OrderDraft, OrderSummary};
use shopbag_core::types::{AddressId, OrderId};
use tracing::instrument;

use crate::error::{Result, add_breadcrumb, refusal_message};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{AddressForm, AddressFormView, Flash};
use crate::services::{PageContext, Visitor};
use crate::state::AppState;

const ADDRESS_NOT_SAVED: &str = "The delivery address could not be saved.";

#[derive(Debug, Deserialize)]
pub struct OrderPageQuery {
    /// Saved address picked from the address list.
    pub address_id: Option<AddressId>,
    /// Start from an empty form instead of a saved address.
    #[serde(default)]
    pub new_address: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "order/new.html")]
pub struct OrderPageTemplate {
    pub page: PageContext,
    pub draft: OrderDraft,
    pub summary: OrderSummary,
    pub addresses: Vec<Address>,
    pub form: AddressFormView,
    pub can_save_address: bool,
    pub error: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "order/show.html")]
pub struct OrderShowTemplate {
    pub page: PageContext,
    pub order: OrderDetail,
}

/// What to do with the address before ordering.
#[derive(Debug, PartialEq, Eq)]
enum AddressAction {
    /// An unchanged saved address.
    Keep(AddressId),
    /// A saved address whose fields were edited.
    Update(AddressId),
    Create,
    /// A new address while the address book is already full.
    BookFull,
}

fn address_action(
    saved: &[Address],
    picked: Option<AddressId>,
    input: &AddressInput,
) -> AddressAction {
    match picked.and_then(|id| saved.iter().find(|a| a.address_id == id)) {
        Some(address)
            if address.matches(input) && address.default_address == input.default_address =>
        {
            AddressAction::Keep(address.address_id)
        }
        Some(address) => AddressAction::Update(address.address_id),
        None if saved.len() >= MAX_ADDRESSES => AddressAction::BookFull,
        None => AddressAction::Create,
    }
}

async fn load_addresses(
    backend: &BackendClient,
    credentials: &Credentials,
) -> std::result::Result<(Vec<Address>, Option<Address>), BackendError> {
    let addresses = backend.addresses(credentials).await?;
    let default = match addresses.iter().find(|a| a.is_default()) {
        Some(address) => Some(address.clone()),
        None => backend.default_address(credentials).await?,
    };
    Ok((addresses, default))
}

async fn draft_or_redirect(visitor: &Visitor) -> Result<std::result::Result<OrderDraft, Response>> {
    match visitor.order_draft().await? {
        Some(draft) if !draft.lines.is_empty() => Ok(Ok(draft)),
        _ => {
            visitor
                .flash(Flash::info("Choose the products to order from your cart."))
                .await?;
            Ok(Err(Redirect::to("/cart").into_response()))
        }
    }
}

/// Display the order form.
///
/// The form starts from the picked saved address, else the default address,
/// else empty.
#[instrument(skip(state, visitor, _user))]
pub async fn new(
    State(state): State<AppState>,
    visitor: Visitor,
    RequireAuth(_user): RequireAuth,
    Query(query): Query<OrderPageQuery>,
) -> Result<Response> {
    let draft = match draft_or_redirect(&visitor).await? {
        Ok(draft) => draft,
        Err(redirect) => return Ok(redirect),
    };

    let credentials = visitor.credentials().await?;
    let loaded = load_addresses(state.backend(), &credentials).await;
    visitor.save_credentials(&credentials).await?;
    let (addresses, default) = loaded?;

    let form = if query.new_address {
        AddressFormView::default()
    } else {
        query
            .address_id
            .and_then(|id| addresses.iter().find(|a| a.address_id == id))
            .or(default.as_ref())
            .map(AddressFormView::from)
            .unwrap_or_default()
    };

    Ok(OrderPageTemplate {
        page: PageContext::load(&state, &visitor).await?,
        summary: draft.summary(),
        draft,
        can_save_address: addresses.len() < MAX_ADDRESSES,
        addresses,
        form,
        error: None,
    }
    .into_response())
}

/// Place the order.
///
/// The address is saved first (created, updated or left alone), then the
/// order is created and the ordered products leave the cart.
#[instrument(skip(state, visitor, user, form), fields(email = %user.email))]
pub async fn create(
    State(state): State<AppState>,
    visitor: Visitor,
    RequireAuth(user): RequireAuth,
    Form(form): Form<AddressForm>,
) -> Result<Response> {
    let draft = match draft_or_redirect(&visitor).await? {
        Ok(draft) => draft,
        Err(redirect) => return Ok(redirect),
    };

    let credentials = visitor.credentials().await?;
    let result = place_order(&state, &credentials, &draft, &form).await;
    visitor.save_credentials(&credentials).await?;

    match result? {
        Ok(order_id) => {
            finish_order(&visitor, &draft).await?;
            add_breadcrumb("order", "Order placed", None);
            visitor
                .flash(Flash::success("Your order has been placed."))
                .await?;
            Ok(Redirect::to(&format!("/orders/{order_id}")).into_response())
        }
        Err(message) => {
            let addresses = state
                .backend()
                .addresses(&credentials)
                .await
                .unwrap_or_default();
            Ok(OrderPageTemplate {
                page: PageContext::load(&state, &visitor).await?,
                summary: draft.summary(),
                draft,
                can_save_address: addresses.len() < MAX_ADDRESSES,
                addresses,
                form: AddressFormView::from(&form),
                error: Some(message),
            }
            .into_response())
        }
    }
}

/// Save the address and create the order.
///
/// The inner `Err` carries a message to show on the re-rendered form.
async fn place_order(
    state: &AppState,
    credentials: &Credentials,
    draft: &OrderDraft,
    form: &AddressForm,
) -> Result<std::result::Result<OrderId, String>> {
    let input = match form.to_input() {
        Ok(input) => input,
        Err(e) => return Ok(Err(e.to_string())),
    };

    let backend = state.backend();
    let saved = backend.addresses(credentials).await?;
    let address_id = match address_action(&saved, form.saved_address_id(), &input) {
        AddressAction::Keep(id) => Some(id),
        AddressAction::Update(id) => match backend.update_address(credentials, id, &input).await {
            Ok(()) => Some(id),
            Err(e) => return Ok(Err(refusal_message(e, ADDRESS_NOT_SAVED)?)),
        },
        AddressAction::Create => match backend.create_address(credentials, &input).await {
            Ok(()) => None,
            Err(e) => return Ok(Err(refusal_message(e, ADDRESS_NOT_SAVED)?)),
        },
        AddressAction::BookFull => {
            return Ok(Err(format!(
                "You can save up to {MAX_ADDRESSES} addresses. Pick a saved address or edit one in your address book."
            )));
        }
    };

    let request = OrderRequest {
        address_id,
        delivery: input,
        order_items: draft.lines.clone(),
        delivery_fee: draft.shipping_cost,
    };
    match backend.create_order(credentials, &request).await {
        Ok(order_id) => Ok(Ok(order_id)),
        Err(e) => Ok(Err(refusal_message(e, "The order could not be placed.")?)),
    }
}

/// Drop the draft and the ordered products from cart, snapshot and selection.
async fn finish_order(visitor: &Visitor, draft: &OrderDraft) -> Result<()> {
    visitor.clear_order_draft().await?;
    let mut cart = visitor.cart().await?;
    let mut snapshot = visitor.snapshot().await?;
    retain_unordered(&mut cart, &mut snapshot, &draft.product_ids());
    visitor.set_cart(&cart).await?;
    visitor.set_snapshot(&snapshot).await?;

    let mut selection = visitor.selection().await?;
    selection.retain_cart(&cart);
    visitor.set_selection(&selection).await
}

/// Display a placed order.
#[instrument(skip(state, visitor, _user), fields(order_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    visitor: Visitor,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let credentials = visitor.credentials().await?;
    let order = state.backend().order(&credentials, id).await;
    visitor.save_credentials(&credentials).await?;

    Ok(OrderShowTemplate {
        page: PageContext::load(&state, &visitor).await?,
        order: order?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopbag_core::types::{DeliveryPhone, YesNo};

    use super::*;

    fn saved(id: i64) -> Address {
        serde_json::from_value(serde_json::json!({
            "addressId": id,
            "postalCode": "06236",
            "deliveryAddress": "Seoul",
            "detailedAddress": "101",
            "deliveryReceiver": "Kim",
            "deliveryPhone": "010-1234-5678",
            "defaultAddress": "N"
        }))
        .unwrap()
    }

    fn input() -> AddressInput {
        AddressInput {
            postal_code: "06236".to_string(),
            delivery_address: "Seoul".to_string(),
            detailed_address: "101".to_string(),
            delivery_receiver: "Kim".to_string(),
            delivery_phone: DeliveryPhone::parse("010-1234-5678").unwrap(),
            delivery_memo: String::new(),
            default_address: YesNo::No,
        }
    }

    #[test]
    fn test_unchanged_saved_address_is_kept() {
        let id = AddressId::new(1);
        assert_eq!(
            address_action(&[saved(1)], Some(id), &input()),
            AddressAction::Keep(id)
        );
    }

    #[test]
    fn test_edited_saved_address_is_updated() {
        let id = AddressId::new(1);
        let mut edited = input();
        edited.detailed_address = "202".to_string();
        assert_eq!(
            address_action(&[saved(1)], Some(id), &edited),
            AddressAction::Update(id)
        );

        let mut made_default = input();
        made_default.default_address = YesNo::Yes;
        assert_eq!(
            address_action(&[saved(1)], Some(id), &made_default),
            AddressAction::Update(id)
        );
    }

    #[test]
    fn test_new_address_created_until_book_is_full() {
        let four: Vec<Address> = (1..=4).map(saved).collect();
        assert_eq!(address_action(&four, None, &input()), AddressAction::Create);

        let five: Vec<Address> = (1..=5).map(saved).collect();
        assert_eq!(address_action(&five, None, &input()), AddressAction::BookFull);
        assert_eq!(
            address_action(&five, Some(AddressId::new(3)), &input()),
            AddressAction::Keep(AddressId::new(3))
        );
    }


    #[test]
    fn test_unknown_picked_id_counts_as_new() {
        assert_eq!(
            address_action(&[saved(1)], Some(AddressId::new(99)), &input()),
            AddressAction::Create
        );
    }
}

//! Member account: overview and address book.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use shopbag_backend::types::{Address, MAX_ADDRESSES};
use shopbag_core::types::AddressId;
use tracing::instrument;

use crate::error::{AppError, Result, refusal_message};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{AddressForm, AddressFormView, CurrentUser, Flash};
use crate::services::{PageContext, Visitor};
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountTemplate {
    pub page: PageContext,
    pub user: CurrentUser,
}

#[derive(Template, WebTemplate)]
#[template(path = "account/addresses.html")]
pub struct AddressesTemplate {
    pub page: PageContext,
    pub addresses: Vec<Address>,
    pub can_add: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "account/address_form.html")]
pub struct AddressFormTemplate {
    pub page: PageContext,
    /// `None` when adding a new address.
    pub address_id: Option<String>,
    pub form: AddressFormView,
    pub error: Option<String>,
}

const NOT_SAVED: &str = "The address could not be saved.";

fn addresses_redirect() -> Response {
    Redirect::to("/account/addresses").into_response()
}

/// Re-render the address form with the submitted values and a message.
async fn form_with_error(
    state: &AppState,
    visitor: &Visitor,
    address_id: Option<AddressId>,
    form: &AddressForm,
    error: String,
) -> Result<Response> {
    Ok(AddressFormTemplate {
        page: PageContext::load(state, visitor).await?,
        address_id: address_id.map(|id| id.to_string()),
        form: AddressFormView::from(form),
        error: Some(error),
    }
    .into_response())
}

/// Account overview.
#[instrument(skip(state, visitor, user))]
pub async fn index(
    State(state): State<AppState>,
    visitor: Visitor,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse> {
    Ok(AccountTemplate {
        page: PageContext::load(&state, &visitor).await?,
        user,
    })
}

/// List saved addresses.
#[instrument(skip(state, visitor, _user))]
pub async fn addresses(
    State(state): State<AppState>,
    visitor: Visitor,
    RequireAuth(_user): RequireAuth,
) -> Result<impl IntoResponse> {
    let credentials = visitor.credentials().await?;
    let addresses = state.backend().addresses(&credentials).await;
    visitor.save_credentials(&credentials).await?;
    let addresses = addresses?;

    Ok(AddressesTemplate {
        page: PageContext::load(&state, &visitor).await?,
        can_add: addresses.len() < MAX_ADDRESSES,
        addresses,
    })
}

/// Empty address form.
#[instrument(skip(state, visitor, _user))]
pub async fn new_address(
    State(state): State<AppState>,
    visitor: Visitor,
    RequireAuth(_user): RequireAuth,
) -> Result<impl IntoResponse> {
    Ok(AddressFormTemplate {
        page: PageContext::load(&state, &visitor).await?,
        address_id: None,
        form: AddressFormView::default(),
        error: None,
    })
}

/// Save a new address, up to the address book limit.
#[instrument(skip(state, visitor, _user, form))]
pub async fn create_address(
    State(state): State<AppState>,
    visitor: Visitor,
    RequireAuth(_user): RequireAuth,
    Form(form): Form<AddressForm>,
) -> Result<Response> {
    let input = match form.to_input() {
        Ok(input) => input,
        Err(e) => return form_with_error(&state, &visitor, None, &form, e.to_string()).await,
    };

    let credentials = visitor.credentials().await?;
    let existing = state.backend().addresses(&credentials).await;
    let result = match existing {
        Ok(list) if list.len() >= MAX_ADDRESSES => None,
        Ok(_) => Some(state.backend().create_address(&credentials, &input).await),
        Err(e) => Some(Err(e)),
    };
    visitor.save_credentials(&credentials).await?;

    match result {
        None => {
            visitor
                .flash(Flash::error(format!(
                    "You can save up to {MAX_ADDRESSES} addresses."
                )))
                .await?;
            Ok(addresses_redirect())
        }
        Some(Ok(())) => {
            visitor.flash(Flash::success("Address saved.")).await?;
            Ok(addresses_redirect())
        }
        Some(Err(e)) => {
            let message = refusal_message(e, NOT_SAVED)?;
            form_with_error(&state, &visitor, None, &form, message).await
        }
    }
}

async fn find_address(
    state: &AppState,
    visitor: &Visitor,
    id: AddressId,
) -> Result<Address> {
    let credentials = visitor.credentials().await?;
    let addresses = state.backend().addresses(&credentials).await;
    visitor.save_credentials(&credentials).await?;
    addresses?
        .into_iter()
        .find(|a| a.address_id == id)
        .ok_or_else(|| AppError::NotFound(format!("address {id}")))
}

/// Edit form for a saved address.
#[instrument(skip(state, visitor, _user), fields(address_id = %id))]
pub async fn edit_address(
    State(state): State<AppState>,
    visitor: Visitor,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<impl IntoResponse> {
    let address = find_address(&state, &visitor, id).await?;
    Ok(AddressFormTemplate {
        page: PageContext::load(&state, &visitor).await?,
        address_id: Some(id.to_string()),
        form: AddressFormView::from(&address),
        error: None,
    })
}

/// Update a saved address.
#[instrument(skip(state, visitor, _user, form), fields(address_id = %id))]
pub async fn update_address(
    State(state): State<AppState>,
    visitor: Visitor,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<AddressId>,
    Form(form): Form<AddressForm>,
) -> Result<Response> {
    let input = match form.to_input() {
        Ok(input) => input,
        Err(e) => return form_with_error(&state, &visitor, Some(id), &form, e.to_string()).await,
    };

    let credentials = visitor.credentials().await?;
    let result = state.backend().update_address(&credentials, id, &input).await;
    visitor.save_credentials(&credentials).await?;

    if let Err(e) = result {
        let message = refusal_message(e, NOT_SAVED)?;
        return form_with_error(&state, &visitor, Some(id), &form, message).await;
    }

    visitor.flash(Flash::success("Address updated.")).await?;
    Ok(addresses_redirect())
}

/// Delete a saved address. The default address stays.
#[instrument(skip(state, visitor, _user), fields(address_id = %id))]
pub async fn delete_address(
    State(state): State<AppState>,
    visitor: Visitor,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Response> {
    let address = find_address(&state, &visitor, id).await?;
    if address.is_default() {
        visitor
            .flash(Flash::error(
                "The default address cannot be deleted. Make another address the default first.",
            ))
            .await?;
        return Ok(addresses_redirect());
    }

    let credentials = visitor.credentials().await?;
    let result = state.backend().delete_address(&credentials, id).await;
    visitor.save_credentials(&credentials).await?;

    let flash = match result {
        Ok(()) => Flash::success("Address deleted."),
        Err(e) => Flash::error(refusal_message(e, "The address could not be deleted.")?),
    };
    visitor.flash(flash).await?;
    Ok(addresses_redirect())
}

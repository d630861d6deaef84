//! Delivery address form shared by the order page and the address book.

use serde::Deserialize;
use shopbag_backend::types::{Address, AddressInput};
use shopbag_core::types::{AddressId, DeliveryPhone, MOBILE_PREFIXES, PhoneError, YesNo};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressFormError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error(transparent)]
    Phone(#[from] PhoneError),
}

/// Submitted address fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressForm {
    /// Saved address picked on the order page, if any.
    #[serde(default)]
    pub address_id: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub delivery_address: String,
    #[serde(default)]
    pub detailed_address: String,
    #[serde(default)]
    pub delivery_receiver: String,
    #[serde(default)]
    pub phone_prefix: String,
    #[serde(default)]
    pub phone_middle: String,
    #[serde(default)]
    pub phone_last: String,
    #[serde(default)]
    pub delivery_memo: String,
    /// Checkbox: present when checked.
    #[serde(default)]
    pub default_address: Option<String>,
}

fn required(value: &str, field: &'static str) -> Result<String, AddressFormError> {
    let value = value.trim();
    if value.is_empty() {
        Err(AddressFormError::Missing(field))
    } else {
        Ok(value.to_string())
    }
}

impl AddressForm {
    /// Validate into the backend's address shape.
    ///
    /// # Errors
    ///
    /// Returns the first missing field or the phone number problem.
    pub fn to_input(&self) -> Result<AddressInput, AddressFormError> {
        Ok(AddressInput {
            postal_code: required(&self.postal_code, "Postal code")?,
            delivery_address: required(&self.delivery_address, "Address")?,
            detailed_address: self.detailed_address.trim().to_string(),
            delivery_receiver: required(&self.delivery_receiver, "Receiver")?,
            delivery_phone: DeliveryPhone::from_parts(
                &self.phone_prefix,
                &self.phone_middle,
                &self.phone_last,
            )?,
            delivery_memo: self.delivery_memo.trim().to_string(),
            default_address: YesNo::from(self.default_address.is_some()),
        })
    }

    /// The saved address this form started from.
    #[must_use]
    pub fn saved_address_id(&self) -> Option<AddressId> {
        self.address_id.trim().parse().ok()
    }
}

/// Values to prefill an address form with.
#[derive(Debug, Clone)]
pub struct AddressFormView {
    pub address_id: Option<String>,
    pub postal_code: String,
    pub delivery_address: String,
    pub detailed_address: String,
    pub delivery_receiver: String,
    pub phone_prefix: String,
    pub phone_middle: String,
    pub phone_last: String,
    pub delivery_memo: String,
    pub default_address: bool,
}

impl Default for AddressFormView {
    fn default() -> Self {
        Self {
            address_id: None,
            postal_code: String::new(),
            delivery_address: String::new(),
            detailed_address: String::new(),
            delivery_receiver: String::new(),
            phone_prefix: MOBILE_PREFIXES[0].to_string(),
            phone_middle: String::new(),
            phone_last: String::new(),
            delivery_memo: String::new(),
            default_address: false,
        }
    }
}

impl AddressFormView {
    /// Prefix options for the phone select.
    #[must_use]
    pub fn prefixes(&self) -> &'static [&'static str] {
        &MOBILE_PREFIXES
    }

    #[must_use]
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.phone_prefix == prefix
    }
}

impl From<&Address> for AddressFormView {
    fn from(address: &Address) -> Self {
        let (phone_prefix, phone_middle, phone_last) = DeliveryPhone::parse(&address.delivery_phone)
            .map_or_else(
                |_| (MOBILE_PREFIXES[0].to_string(), String::new(), String::new()),
                |phone| {
                    (
                        phone.prefix().to_string(),
                        phone.middle().to_string(),
                        phone.last().to_string(),
                    )
                },
            );
        Self {
            address_id: Some(address.address_id.to_string()),
            postal_code: address.postal_code.clone(),
            delivery_address: address.delivery_address.clone(),
            detailed_address: address.detailed_address.clone(),
            delivery_receiver: address.delivery_receiver.clone(),
            phone_prefix,
            phone_middle,
            phone_last,
            delivery_memo: address.delivery_memo.clone().unwrap_or_default(),
            default_address: address.is_default(),
        }
    }
}

impl From<&AddressForm> for AddressFormView {
    fn from(form: &AddressForm) -> Self {
        Self {
            address_id: form.saved_address_id().map(|id| id.to_string()),
            postal_code: form.postal_code.clone(),
            delivery_address: form.delivery_address.clone(),
            detailed_address: form.detailed_address.clone(),
            delivery_receiver: form.delivery_receiver.clone(),
            phone_prefix: form.phone_prefix.clone(),
            phone_middle: form.phone_middle.clone(),
            phone_last: form.phone_last.clone(),
            delivery_memo: form.delivery_memo.clone(),
            default_address: form.default_address.is_some(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> AddressForm {
        AddressForm {
            address_id: String::new(),
            postal_code: "06236".to_string(),
            delivery_address: "Teheran-ro 1".to_string(),
            detailed_address: " 101 ".to_string(),
            delivery_receiver: "Kim".to_string(),
            phone_prefix: "010".to_string(),
            phone_middle: "1234".to_string(),
            phone_last: "5678".to_string(),
            delivery_memo: String::new(),
            default_address: Some("on".to_string()),
        }
    }

    #[test]
    fn test_valid_form_builds_input() {
        let input = form().to_input().unwrap();
        assert_eq!(input.delivery_phone.to_string(), "010-1234-5678");
        assert_eq!(input.detailed_address, "101");
        assert!(input.default_address.is_yes());
        assert!(form().saved_address_id().is_none());
    }

    #[test]
    fn test_missing_receiver_reported() {
        let mut form = form();
        form.delivery_receiver = "  ".to_string();
        assert_eq!(
            form.to_input().unwrap_err(),
            AddressFormError::Missing("Receiver")
        );
    }

    #[test]
    fn test_bad_phone_prefix_reported() {
        let mut form = form();
        form.phone_prefix = "019".to_string();
        assert!(matches!(
            form.to_input().unwrap_err(),
            AddressFormError::Phone(PhoneError::Prefix(_))
        ));
    }

    #[test]
    fn test_view_splits_saved_phone() {
        let address: Address = serde_json::from_value(serde_json::json!({
            "addressId": 4,
            "postalCode": "06236",
            "deliveryAddress": "Seoul",
            "deliveryReceiver": "Lee",
            "deliveryPhone": "011-987-6543",
            "defaultAddress": "Y"
        }))
        .unwrap();
        let view = AddressFormView::from(&address);
        assert_eq!(view.address_id.as_deref(), Some("4"));
        assert_eq!(view.phone_prefix, "011");
        assert_eq!(view.phone_middle, "987");
        assert_eq!(view.phone_last, "6543");
        assert!(view.default_address);
    }
}

//! Storefront view and session models.

pub mod address;
pub mod session;

pub use address::{AddressForm, AddressFormError, AddressFormView};
pub use session::{CurrentUser, Flash, FlashLevel, keys as session_keys};

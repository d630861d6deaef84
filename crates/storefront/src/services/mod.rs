//! Request-scoped services for the storefront.
//!
//! - `visitor` - typed session state
//! - `cart_sync` - mirrors the session cart to the backend
//! - `page` - data shared by every rendered page (navigation, cart badge)

pub mod cart_sync;
pub mod page;
pub mod visitor;

pub use page::PageContext;
pub use visitor::Visitor;

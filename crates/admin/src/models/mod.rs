//! Session types and view helpers for the admin console.

pub mod pager;
pub mod session;

pub use pager::PagerView;
pub use session::{CurrentAdmin, Flash, FlashLevel, keys as session_keys};

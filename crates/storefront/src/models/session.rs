//! Types stored in the visitor's session.

use serde::{Deserialize, Serialize};
use shopbag_backend::AuthTokens;
use shopbag_core::types::Role;

/// The logged-in member, derived from the access token at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    /// Read the member from a fresh token pair.
    ///
    /// Falls back to the login email when the token carries no subject.
    #[must_use]
    pub fn from_tokens(tokens: &AuthTokens, login_email: &str) -> Self {
        let claims = tokens.claims().unwrap_or_default();
        Self {
            email: claims.sub.clone().unwrap_or_else(|| login_email.to_string()),
            role: claims.role(),
        }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

impl FlashLevel {
    /// CSS modifier used by the alert box.
    #[must_use]
    pub const fn css(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Error => "danger",
        }
    }
}

/// A one-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }
}

/// Session keys.
pub mod keys {
    /// Lines the visitor put in the cart.
    pub const LOCAL_CART: &str = "local_cart";

    /// Last cart contents confirmed by the backend for the member.
    pub const DB_CART: &str = "db_cart";

    /// Set once the member's server cart has been read and merged.
    pub const CART_SYNCED: &str = "cart_synced";

    /// Order lines and shipping cost carried from the cart to the order page.
    pub const ORDER_DRAFT: &str = "order_draft";

    /// Selected cart lines and the coupons applied to them.
    pub const CHECKOUT_SELECTION: &str = "checkout_selection";

    pub const AUTH_TOKENS: &str = "auth_tokens";

    pub const CURRENT_USER: &str = "current_user";

    pub const FLASH: &str = "flash";

    /// Welcome coupon codes already downloaded in this session.
    pub const DOWNLOADED_COUPONS: &str = "downloaded_coupons";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_current_user_falls_back_to_login_email() {
        let tokens = AuthTokens {
            access_token: "opaque".to_string(),
            refresh_token: None,
        };
        let user = CurrentUser::from_tokens(&tokens, "kim@shop.kr");
        assert_eq!(user.email, "kim@shop.kr");
        assert!(!user.is_admin());
    }

    #[test]
    fn test_flash_round_trips_through_json() {
        let flash = Flash::error("Coupon already issued");
        let json = serde_json::to_string(&flash).unwrap();
        assert_eq!(serde_json::from_str::<Flash>(&json).unwrap(), flash);
        assert_eq!(flash.level.css(), "danger");
    }
}

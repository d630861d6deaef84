//! Typed access to the visitor's session state.
//!
//! Everything the browser would otherwise keep in local storage is read and
//! written through [`Visitor`]: the cart and its snapshot, the checkout
//! selection, the order draft and the tokens.

use axum::{extract::FromRequestParts, http::StatusCode, http::request::Parts};
use serde::{Serialize, de::DeserializeOwned};
use shopbag_backend::{AuthTokens, Credentials};
use shopbag_core::cart::LocalCart;
use shopbag_core::checkout::{CheckoutSelection, OrderDraft};
use tower_sessions::Session;

use crate::error::Result;
use crate::models::{CurrentUser, Flash, session_keys};

/// The current visitor's session.
#[derive(Clone)]
pub struct Visitor {
    session: Session,
}

impl<S> FromRequestParts<S> for Visitor
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(Self::new)
            .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "Session layer missing"))
    }
}

impl Visitor {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    async fn load<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        Ok(self.session.get::<T>(key).await?.unwrap_or_default())
    }

    async fn store<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<()> {
        self.session.insert(key, value).await?;
        Ok(())
    }

    pub async fn cart(&self) -> Result<LocalCart> {
        self.load(session_keys::LOCAL_CART).await
    }

    pub async fn set_cart(&self, cart: &LocalCart) -> Result<()> {
        self.store(session_keys::LOCAL_CART, cart).await
    }

    /// Last cart state the backend confirmed for the member.
    pub async fn snapshot(&self) -> Result<LocalCart> {
        self.load(session_keys::DB_CART).await
    }

    pub async fn set_snapshot(&self, snapshot: &LocalCart) -> Result<()> {
        self.store(session_keys::DB_CART, snapshot).await
    }

    /// Whether the snapshot reflects the member's server cart.
    ///
    /// Until it does, diffs against the snapshot would resend lines the
    /// backend already holds.
    pub async fn cart_synced(&self) -> Result<bool> {
        self.load(session_keys::CART_SYNCED).await
    }

    pub async fn set_cart_synced(&self, synced: bool) -> Result<()> {
        self.store(session_keys::CART_SYNCED, &synced).await
    }

    pub async fn selection(&self) -> Result<CheckoutSelection> {
        self.load(session_keys::CHECKOUT_SELECTION).await
    }

    pub async fn set_selection(&self, selection: &CheckoutSelection) -> Result<()> {
        self.store(session_keys::CHECKOUT_SELECTION, selection).await
    }

    pub async fn order_draft(&self) -> Result<Option<OrderDraft>> {
        Ok(self.session.get(session_keys::ORDER_DRAFT).await?)
    }

    pub async fn set_order_draft(&self, draft: &OrderDraft) -> Result<()> {
        self.store(session_keys::ORDER_DRAFT, draft).await
    }

    pub async fn clear_order_draft(&self) -> Result<()> {
        self.session
            .remove::<OrderDraft>(session_keys::ORDER_DRAFT)
            .await?;
        Ok(())
    }

    pub async fn current_user(&self) -> Result<Option<CurrentUser>> {
        Ok(self.session.get(session_keys::CURRENT_USER).await?)
    }

    /// Credentials for backend calls made on this visitor's behalf.
    pub async fn credentials(&self) -> Result<Credentials> {
        let tokens: Option<AuthTokens> = self.session.get(session_keys::AUTH_TOKENS).await?;
        Ok(Credentials::new(tokens))
    }

    /// Store a fresh login.
    ///
    /// The session ID is cycled so a pre-login session cannot be fixated.
    /// The server cart has not been read yet for this member.
    pub async fn log_in(&self, tokens: &AuthTokens, user: &CurrentUser) -> Result<()> {
        self.session.cycle_id().await?;
        self.store(session_keys::AUTH_TOKENS, tokens).await?;
        self.store(session_keys::CURRENT_USER, user).await?;
        self.set_cart_synced(false).await
    }

    /// End the member's visit.
    ///
    /// Both carts, the checkout selection, the order draft and the downloaded
    /// coupons belong to the member and go with them, so the next login on
    /// this browser starts clean.
    pub async fn log_out(&self) -> Result<()> {
        self.forget_tokens().await?;
        self.session.remove_value(session_keys::LOCAL_CART).await?;
        self.session.remove_value(session_keys::DB_CART).await?;
        self.session
            .remove_value(session_keys::CHECKOUT_SELECTION)
            .await?;
        self.session.remove_value(session_keys::ORDER_DRAFT).await?;
        self.session
            .remove_value(session_keys::DOWNLOADED_COUPONS)
            .await?;
        Ok(())
    }

    /// Drop the tokens and user but keep the cart for a later login.
    async fn forget_tokens(&self) -> Result<()> {
        self.session.remove_value(session_keys::AUTH_TOKENS).await?;
        self.session.remove_value(session_keys::CURRENT_USER).await?;
        self.session.remove_value(session_keys::CART_SYNCED).await?;
        Ok(())
    }

    /// Write back tokens that a backend call refreshed or dropped.
    pub async fn save_credentials(&self, credentials: &Credentials) -> Result<()> {
        if !credentials.changed() {
            return Ok(());
        }
        match credentials.tokens().await {
            Some(tokens) => self.store(session_keys::AUTH_TOKENS, &tokens).await,
            None => {
                tracing::info!("Refresh token rejected, logging visitor out");
                self.forget_tokens().await
            }
        }
    }

    pub async fn flash(&self, flash: Flash) -> Result<()> {
        let mut pending: Vec<Flash> = self.load(session_keys::FLASH).await?;
        pending.push(flash);
        self.store(session_keys::FLASH, &pending).await
    }

    /// Pending messages, removed from the session.
    pub async fn take_flashes(&self) -> Result<Vec<Flash>> {
        Ok(self
            .session
            .remove::<Vec<Flash>>(session_keys::FLASH)
            .await?
            .unwrap_or_default())
    }

    pub async fn downloaded_coupons(&self) -> Result<Vec<String>> {
        self.load(session_keys::DOWNLOADED_COUPONS).await
    }

    pub async fn mark_coupon_downloaded(&self, code: &str) -> Result<()> {
        let mut codes = self.downloaded_coupons().await?;
        if !codes.iter().any(|c| c == code) {
            codes.push(code.to_string());
        }
        self.store(session_keys::DOWNLOADED_COUPONS, &codes).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use shopbag_core::types::ProductId;
    use tower_sessions::MemoryStore;

    use super::*;

    fn visitor() -> Visitor {
        Visitor::new(Session::new(None, Arc::new(MemoryStore::default()), None))
    }

    #[tokio::test]
    async fn test_cart_defaults_to_empty() {
        let visitor = visitor();
        assert!(visitor.cart().await.unwrap().is_empty());
        assert!(visitor.order_draft().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cart_round_trip() {
        let visitor = visitor();
        let mut cart = LocalCart::new();
        cart.add(ProductId::new(3), Some(2)).unwrap();
        visitor.set_cart(&cart).await.unwrap();
        assert_eq!(visitor.cart().await.unwrap(), cart);
    }

    #[tokio::test]
    async fn test_flashes_are_taken_once() {
        let visitor = visitor();
        visitor.flash(Flash::info("one")).await.unwrap();
        visitor.flash(Flash::error("two")).await.unwrap();
        assert_eq!(visitor.take_flashes().await.unwrap().len(), 2);
        assert!(visitor.take_flashes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_tokens_log_out() {
        let visitor = visitor();
        let tokens = AuthTokens {
            access_token: "a".to_string(),
            refresh_token: Some("r".to_string()),
        };
        let user = CurrentUser {
            email: "kim@shop.kr".to_string(),
            role: shopbag_core::types::Role::User,
        };
        visitor.log_in(&tokens, &user).await.unwrap();
        assert!(visitor.current_user().await.unwrap().is_some());

        let credentials = visitor.credentials().await.unwrap();
        credentials.set(None).await;
        visitor.save_credentials(&credentials).await.unwrap();

        assert!(visitor.current_user().await.unwrap().is_none());
        assert!(!visitor.credentials().await.unwrap().is_logged_in().await);
    }

    fn member() -> (AuthTokens, CurrentUser) {
        (
            AuthTokens {
                access_token: "a".to_string(),
                refresh_token: Some("r".to_string()),
            },
            CurrentUser {
                email: "kim@shop.kr".to_string(),
                role: shopbag_core::types::Role::User,
            },
        )
    }

    #[tokio::test]
    async fn test_log_out_leaves_nothing_for_the_next_member() {
        let visitor = visitor();
        let (tokens, user) = member();
        visitor.log_in(&tokens, &user).await.unwrap();
        visitor.set_cart_synced(true).await.unwrap();

        let mut cart = LocalCart::new();
        cart.add(ProductId::new(1), Some(1)).unwrap();
        visitor.set_cart(&cart).await.unwrap();
        visitor.set_snapshot(&cart).await.unwrap();

        let line = shopbag_core::checkout::CheckoutLine {
            product_id: ProductId::new(1),
            name: "Green tea".to_string(),
            unit_price: shopbag_core::types::Won::new(10_000),
            quantity: 1,
            stock: 3,
        };
        let coupon = shopbag_core::checkout::CouponChoice {
            coupon_member_id: shopbag_core::types::CouponMemberId::new(77),
            name: "Welcome".to_string(),
            kind: shopbag_core::types::CouponKind::Amount,
            value: 1_000,
            percentage: 0,
        };
        let mut selection = CheckoutSelection::new();
        selection.apply_coupon(&line, coupon).unwrap();
        visitor.set_selection(&selection).await.unwrap();
        visitor.mark_coupon_downloaded("WELCOME").await.unwrap();

        visitor.log_out().await.unwrap();

        assert!(visitor.current_user().await.unwrap().is_none());
        assert!(!visitor.credentials().await.unwrap().is_logged_in().await);
        assert!(visitor.cart().await.unwrap().is_empty());
        assert!(visitor.snapshot().await.unwrap().is_empty());
        assert!(visitor.selection().await.unwrap().coupons().is_empty());
        assert!(visitor.selection().await.unwrap().selected().is_empty());
        assert!(visitor.order_draft().await.unwrap().is_none());
        assert!(visitor.downloaded_coupons().await.unwrap().is_empty());
        assert!(!visitor.cart_synced().await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_refresh_keeps_the_cart() {
        let visitor = visitor();
        let (tokens, user) = member();
        visitor.log_in(&tokens, &user).await.unwrap();
        let mut cart = LocalCart::new();
        cart.add(ProductId::new(2), None).unwrap();
        visitor.set_cart(&cart).await.unwrap();

        let credentials = visitor.credentials().await.unwrap();
        credentials.set(None).await;
        visitor.save_credentials(&credentials).await.unwrap();

        assert!(visitor.current_user().await.unwrap().is_none());
        assert_eq!(visitor.cart().await.unwrap(), cart);
    }
}

//! Server-side cart endpoints and replaying a sync plan.

use shopbag_core::cart::{CartItem, CartSyncPlan, LocalCart, SyncStep, record_synced};
use shopbag_core::types::ProductId;
use tracing::instrument;

use crate::BackendClient;
use crate::auth::Credentials;
use crate::error::BackendError;
use crate::types::{ServerCart, ServerCartItem};

impl BackendClient {
    /// The member's cart as stored on the backend.
    ///
    /// # Errors
    ///
    /// Returns `NotLoggedIn` without credentials.
    #[instrument(skip(self, credentials))]
    pub async fn server_cart(
        &self,
        credentials: &Credentials,
    ) -> Result<Vec<CartItem>, BackendError> {
        let url = self.endpoint("/api/carts")?;
        let body = self
            .send_authorized(credentials, |http| Ok(http.get(url.clone())))
            .await?;
        let cart: ServerCart = Self::parse(&body, "cart")?;
        Ok(cart.carts.into_iter().map(CartItem::from).collect())
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, credentials))]
    pub async fn add_cart_item(
        &self,
        credentials: &Credentials,
        item: CartItem,
    ) -> Result<(), BackendError> {
        let url = self.endpoint("/api/carts")?;
        let body = ServerCartItem::from(item);
        self.send_authorized(credentials, |http| Ok(http.post(url.clone()).json(&body)))
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, credentials))]
    pub async fn update_cart_item(
        &self,
        credentials: &Credentials,
        item: CartItem,
    ) -> Result<(), BackendError> {
        let url = self.endpoint("/api/carts")?;
        let body = ServerCartItem::from(item);
        self.send_authorized(credentials, |http| Ok(http.put(url.clone()).json(&body)))
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, credentials), fields(product_id = %id))]
    pub async fn delete_cart_item(
        &self,
        credentials: &Credentials,
        id: ProductId,
    ) -> Result<(), BackendError> {
        let url = self.endpoint(&format!("/api/carts/{id}"))?;
        self.send_authorized(credentials, |http| Ok(http.delete(url.clone())))
            .await?;
        Ok(())
    }

    /// Empty the member's server cart in one call.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, credentials))]
    pub async fn clear_server_cart(&self, credentials: &Credentials) -> Result<(), BackendError> {
        let url = self.endpoint("/api/carts")?;
        self.send_authorized(credentials, |http| Ok(http.delete(url.clone())))
            .await?;
        Ok(())
    }

    /// Run a sync plan, advancing `snapshot` after each call that succeeds.
    ///
    /// Stops at the first failure; the snapshot then reflects exactly what
    /// the backend confirmed, so the next sync retries the rest.
    ///
    /// # Errors
    ///
    /// Returns the first failing call's error.
    #[instrument(
        skip_all,
        fields(add = plan.add.len(), update = plan.update.len(), delete = plan.delete.len())
    )]
    pub async fn apply_cart_plan(
        &self,
        credentials: &Credentials,
        plan: &CartSyncPlan,
        snapshot: &mut LocalCart,
    ) -> Result<(), BackendError> {
        for item in &plan.add {
            self.add_cart_item(credentials, *item).await?;
            record_synced(snapshot, SyncStep::Added(*item));
        }
        for item in &plan.update {
            self.update_cart_item(credentials, *item).await?;
            record_synced(snapshot, SyncStep::Updated(*item));
        }
        for id in &plan.delete {
            self.delete_cart_item(credentials, *id).await?;
            record_synced(snapshot, SyncStep::Deleted(*id));
        }
        Ok(())
    }
}

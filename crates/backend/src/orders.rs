//! Order placement and lookup.

use shopbag_core::types::OrderId;
use tracing::instrument;

use crate::BackendClient;
use crate::auth::Credentials;
use crate::error::BackendError;
use crate::types::{OrderCreated, OrderDetail, OrderRequest};

impl BackendClient {
    /// Place an order and return its ID.
    ///
    /// # Errors
    ///
    /// Returns `Rejected` with the backend's message when the order is refused
    /// (stock changed, coupon no longer valid).
    #[instrument(skip(self, credentials, request), fields(lines = request.order_items.len()))]
    pub async fn create_order(
        &self,
        credentials: &Credentials,
        request: &OrderRequest,
    ) -> Result<OrderId, BackendError> {
        let url = self.endpoint("/api/order")?;
        let body = self
            .send_authorized(credentials, |http| Ok(http.post(url.clone()).json(request)))
            .await?;
        let created: OrderCreated = Self::parse(&body, "order")?;
        tracing::info!(order_id = %created.order_id, "Order placed");
        Ok(created.order_id)
    }

    /// # Errors
    ///
    /// Returns `NotFound` for unknown orders.
    #[instrument(skip(self, credentials), fields(order_id = %id))]
    pub async fn order(
        &self,
        credentials: &Credentials,
        id: OrderId,
    ) -> Result<OrderDetail, BackendError> {
        let url = self.endpoint(&format!("/api/order/{id}"))?;
        let body = self
            .send_authorized(credentials, |http| Ok(http.get(url.clone())))
            .await?;
        Self::parse(&body, "order detail")
    }
}

//! Mirror the visitor's cart to the backend.
//!
//! The local cart in the session is the source of truth while browsing. For a
//! logged-in member every change is replayed against the backend as a diff
//! from the last confirmed snapshot, so only the changed lines are sent.
//!
//! The snapshot only means something once the member's server cart has been
//! read. Until then (right after login, or when that read failed) the next
//! sync reads it first and merges it into the local cart.

use shopbag_backend::{BackendClient, BackendError, Credentials};
use shopbag_core::cart::{LocalCart, plan_sync};
use tracing::instrument;

use crate::error::Result;
use crate::models::Flash;
use crate::services::visitor::Visitor;

const LOGIN_EXPIRED: &str = "Your login expired. Log in again to save your cart.";

/// Push local cart changes to the backend.
///
/// Backend failures do not fail the request: the snapshot keeps whatever was
/// confirmed and the next change retries the rest.
///
/// # Errors
///
/// Returns an error only if the session cannot be read or written.
#[instrument(skip_all)]
pub async fn sync(backend: &BackendClient, visitor: &Visitor) -> Result<()> {
    let credentials = visitor.credentials().await?;
    if !credentials.is_logged_in().await {
        return Ok(());
    }

    let outcome = push(backend, visitor, &credentials).await;
    visitor.save_credentials(&credentials).await?;
    report(visitor, outcome?).await
}

/// Merge the member's saved cart into the local one right after login.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
#[instrument(skip_all)]
pub async fn merge_after_login(backend: &BackendClient, visitor: &Visitor) -> Result<()> {
    visitor.set_cart_synced(false).await?;
    sync(backend, visitor).await
}

/// Empty the cart, on the backend too for a member.
///
/// A synced member's server cart is cleared in one call instead of one
/// delete per line.
///
/// # Errors
///
/// Returns an error only if the session cannot be read or written.
#[instrument(skip_all)]
pub async fn clear(backend: &BackendClient, visitor: &Visitor) -> Result<()> {
    visitor.set_cart(&LocalCart::new()).await?;

    let credentials = visitor.credentials().await?;
    if !credentials.is_logged_in().await
        || !visitor.cart_synced().await?
        || visitor.snapshot().await?.is_empty()
    {
        return sync(backend, visitor).await;
    }

    let cleared = backend.clear_server_cart(&credentials).await;
    visitor.save_credentials(&credentials).await?;
    match cleared {
        Ok(()) => visitor.set_snapshot(&LocalCart::new()).await,
        Err(e) => {
            tracing::warn!(error = %e, "Could not clear saved cart");
            if e.needs_login() {
                visitor.flash(Flash::info(LOGIN_EXPIRED)).await?;
                return Ok(());
            }
            sync(backend, visitor).await
        }
    }
}

/// Read the server cart if needed, then replay the plan.
///
/// The outer `Result` is for the session; the inner one carries the first
/// backend failure.
async fn push(
    backend: &BackendClient,
    visitor: &Visitor,
    credentials: &Credentials,
) -> Result<std::result::Result<(), BackendError>> {
    let mut cart = visitor.cart().await?;

    if !visitor.cart_synced().await? {
        let server = match backend.server_cart(credentials).await {
            Ok(items) => items,
            Err(e) => return Ok(Err(e)),
        };
        cart.merge_server(&server);
        visitor.set_cart(&cart).await?;
        visitor
            .set_snapshot(&LocalCart::from_items(server))
            .await?;
        visitor.set_cart_synced(true).await?;
    }

    let mut snapshot = visitor.snapshot().await?;
    let plan = plan_sync(&cart, &snapshot);
    if plan.is_empty() {
        return Ok(Ok(()));
    }

    let outcome = backend
        .apply_cart_plan(credentials, &plan, &mut snapshot)
        .await;
    visitor.set_snapshot(&snapshot).await?;
    Ok(outcome)
}

async fn report(visitor: &Visitor, outcome: std::result::Result<(), BackendError>) -> Result<()> {
    if let Err(e) = outcome {
        tracing::warn!(error = %e, "Cart sync incomplete");
        if e.needs_login() {
            visitor.flash(Flash::info(LOGIN_EXPIRED)).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use shopbag_backend::{AuthTokens, BackendConfig};
    use shopbag_core::cart::CartItem;
    use shopbag_core::types::{ProductId, Role};
    use tower_sessions::{MemoryStore, Session};
    use url::Url;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::models::CurrentUser;

    fn backend(server: &MockServer) -> BackendClient {
        BackendClient::new(&BackendConfig {
            base_url: Url::parse(&server.uri()).unwrap(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn visitor() -> Visitor {
        Visitor::new(Session::new(None, Arc::new(MemoryStore::default()), None))
    }

    async fn member(visitor: &Visitor) {
        let tokens = AuthTokens {
            access_token: "a1".to_string(),
            refresh_token: Some("r1".to_string()),
        };
        let user = CurrentUser {
            email: "kim@shop.kr".to_string(),
            role: Role::User,
        };
        visitor.log_in(&tokens, &user).await.unwrap();
    }

    fn cart_of(items: &[(i64, u32)]) -> LocalCart {
        LocalCart::from_items(
            items
                .iter()
                .map(|&(id, quantity)| CartItem::new(ProductId::new(id), quantity))
                .collect(),
        )
    }

    fn ids(cart: &LocalCart) -> Vec<i64> {
        cart.items().iter().map(|item| item.id.as_i64()).collect()
    }

    async fn saved_cart(server: &MockServer, items: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/api/carts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "carts": items })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_guest_cart_stays_local() {
        let server = MockServer::start().await;
        let visitor = visitor();
        visitor.set_cart(&cart_of(&[(1, 1)])).await.unwrap();

        sync(&backend(&server), &visitor).await.unwrap();

        assert!(server.received_requests().await.unwrap().is_empty());
        assert!(visitor.snapshot().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_member_add_is_posted_and_snapshot_advances() {
        let server = MockServer::start().await;
        saved_cart(&server, json!([])).await;
        Mock::given(method("POST"))
            .and(path("/api/carts"))
            .and(body_json(json!({"productId": 5, "quantity": 2})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let visitor = visitor();
        member(&visitor).await;
        let backend = backend(&server);
        merge_after_login(&backend, &visitor).await.unwrap();

        visitor.set_cart(&cart_of(&[(5, 2)])).await.unwrap();
        sync(&backend, &visitor).await.unwrap();

        assert_eq!(visitor.snapshot().await.unwrap(), cart_of(&[(5, 2)]));
    }

    #[tokio::test]
    async fn test_login_merge_puts_server_lines_first() {
        let server = MockServer::start().await;
        saved_cart(
            &server,
            json!([
                {"productId": 2, "quantity": 4},
                {"productId": 3, "quantity": 1}
            ]),
        )
        .await;
        Mock::given(method("POST"))
            .and(path("/api/carts"))
            .and(body_json(json!({"productId": 9, "quantity": 1})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let visitor = visitor();
        visitor.set_cart(&cart_of(&[(9, 1), (2, 1)])).await.unwrap();
        member(&visitor).await;
        merge_after_login(&backend(&server), &visitor).await.unwrap();

        let cart = visitor.cart().await.unwrap();
        assert_eq!(ids(&cart), vec![2, 3, 9]);
        assert_eq!(cart.quantity_of(ProductId::new(2)), Some(4));
        assert_eq!(visitor.snapshot().await.unwrap(), cart);
        assert!(visitor.cart_synced().await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_post_keeps_snapshot_and_asks_for_login() {
        let server = MockServer::start().await;
        saved_cart(&server, json!([])).await;
        Mock::given(method("POST"))
            .and(path("/api/carts"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/token"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let visitor = visitor();
        member(&visitor).await;
        let backend = backend(&server);
        merge_after_login(&backend, &visitor).await.unwrap();

        visitor.set_cart(&cart_of(&[(5, 1)])).await.unwrap();
        sync(&backend, &visitor).await.unwrap();

        assert!(visitor.snapshot().await.unwrap().is_empty());
        let flashes = visitor.take_flashes().await.unwrap();
        assert_eq!(flashes.len(), 1);
        assert_eq!(flashes.first().unwrap().message, LOGIN_EXPIRED);
    }

    #[tokio::test]
    async fn test_unread_server_cart_is_not_overwritten() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/carts"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        saved_cart(&server, json!([{"productId": 5, "quantity": 3}])).await;
        Mock::given(method("POST"))
            .and(path("/api/carts"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let visitor = visitor();
        visitor.set_cart(&cart_of(&[(5, 1)])).await.unwrap();
        member(&visitor).await;
        let backend = backend(&server);

        merge_after_login(&backend, &visitor).await.unwrap();
        assert!(!visitor.cart_synced().await.unwrap());

        sync(&backend, &visitor).await.unwrap();
        assert!(visitor.cart_synced().await.unwrap());
        assert_eq!(visitor.cart().await.unwrap(), cart_of(&[(5, 3)]));
    }

    #[tokio::test]
    async fn test_clear_empties_server_cart_in_one_call() {
        let server = MockServer::start().await;
        saved_cart(
            &server,
            json!([
                {"productId": 1, "quantity": 1},
                {"productId": 2, "quantity": 1}
            ]),
        )
        .await;
        Mock::given(method("DELETE"))
            .and(path("/api/carts"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let visitor = visitor();
        member(&visitor).await;
        let backend = backend(&server);
        merge_after_login(&backend, &visitor).await.unwrap();

        clear(&backend, &visitor).await.unwrap();

        assert!(visitor.cart().await.unwrap().is_empty());
        assert!(visitor.snapshot().await.unwrap().is_empty());
        let deletes = server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.method.as_str() == "DELETE")
            .count();
        assert_eq!(deletes, 1);
    }
}

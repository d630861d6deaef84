//! Backend client behaviour against a mock REST API.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use serde_json::json;
use shopbag_backend::{
    AuthTokens, BackendClient, BackendConfig, BackendError, BannerUpload, Credentials, FilePart,
};
use shopbag_core::cart::{CartItem, LocalCart, plan_sync};
use shopbag_core::types::{CouponId, OrderId, ProductId};
use url::Url;
use wiremock::matchers::{body_string, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> BackendClient {
    BackendClient::new(&BackendConfig {
        base_url: Url::parse(&server.uri()).unwrap(),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

fn logged_in(access: &str) -> Credentials {
    Credentials::new(Some(AuthTokens {
        access_token: access.to_string(),
        refresh_token: Some("r1".to_string()),
    }))
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/carts"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "carts": [{"productId": 7, "quantity": 2}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cart = client(&server).server_cart(&logged_in("a1")).await.unwrap();
    assert_eq!(
        cart,
        vec![CartItem {
            id: ProductId::new(7),
            quantity: 2
        }]
    );
}

#[tokio::test]
async fn test_anonymous_call_needs_login() {
    let server = MockServer::start().await;
    let err = client(&server)
        .server_cart(&Credentials::anonymous())
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::NotLoggedIn));
}

#[tokio::test]
async fn test_unauthorized_refreshes_and_retries_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/carts"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token"))
        .and(header("cookie", "refreshToken=r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": "fresh"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/carts"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"carts": []})))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = logged_in("stale");
    let cart = client(&server).server_cart(&credentials).await.unwrap();

    assert!(cart.is_empty());
    assert!(credentials.changed());
    let tokens = credentials.tokens().await.unwrap();
    assert_eq!(tokens.access_token, "fresh");
    assert_eq!(tokens.refresh_token.as_deref(), Some("r1"));
}

#[tokio::test]
async fn test_second_unauthorized_is_returned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/addresses"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": "fresh"})))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .addresses(&logged_in("stale"))
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Unauthorized));
    assert!(err.needs_login());
}

#[tokio::test]
async fn test_failed_refresh_logs_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/carts"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = logged_in("stale");
    let err = client(&server).server_cart(&credentials).await.unwrap_err();

    assert!(matches!(err, BackendError::TokenRefresh(_)));
    assert!(!credentials.is_logged_in().await);
    assert!(credentials.changed());
}

#[tokio::test]
async fn test_concurrent_calls_share_one_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/addresses"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": "fresh"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/addresses"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let backend = client(&server);
    let credentials = logged_in("stale");
    let (a, b) = tokio::join!(
        backend.addresses(&credentials),
        backend.addresses(&credentials)
    );
    assert!(a.unwrap().is_empty());
    assert!(b.unwrap().is_empty());
}

#[tokio::test]
async fn test_coupon_registration_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/coupons"))
        .and(body_string("WELCOME10"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({"message": "already issued"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .register_coupon(&logged_in("a1"), " WELCOME10 ")
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Conflict(_)));
    assert_eq!(err.user_message(), Some("already issued"));
}

#[tokio::test]
async fn test_coupon_order_reads_raw_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/coupons/4/order"))
        .respond_with(ResponseTemplate::new(200).set_body_string("1234"))
        .mount(&server)
        .await;

    let order = client(&server)
        .coupon_order(&logged_in("a1"), CouponId::new(4))
        .await
        .unwrap();
    assert_eq!(order, OrderId::new(1234));
}

#[tokio::test]
async fn test_member_coupons_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/coupons"))
        .and(query_param("page", "2"))
        .and(query_param("includeInActiveCoupons", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "coupons": [{
                "id": 1, "name": "10% off", "type": "PERCENTAGE",
                "value": 0, "percentage": 10, "minValue": 0,
                "active": false, "used": true
            }],
            "totalPages": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = client(&server)
        .member_coupons(&logged_in("a1"), 2, true)
        .await
        .unwrap();
    assert_eq!(page.total_pages, 3);
    assert!(page.coupons.first().unwrap().used);
}

#[tokio::test]
async fn test_categories_are_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Tea", "displayOrder": 1, "parentId": null}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let backend = client(&server);
    let first = backend.categories().await.unwrap();
    let second = backend.categories().await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
}

#[tokio::test]
async fn test_default_address_empty_body_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/addresses/default"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let address = client(&server)
        .default_address(&logged_in("a1"))
        .await
        .unwrap();
    assert!(address.is_none());
}

#[tokio::test]
async fn test_cart_plan_stops_at_first_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/carts"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/carts"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let mut local = LocalCart::new();
    local.add(ProductId::new(1), Some(1)).unwrap();
    local.add(ProductId::new(2), Some(5)).unwrap();
    let mut snapshot = LocalCart::new();
    snapshot.add(ProductId::new(2), Some(1)).unwrap();

    let plan = plan_sync(&local, &snapshot);
    let result = client(&server)
        .apply_cart_plan(&logged_in("a1"), &plan, &mut snapshot)
        .await;

    assert!(matches!(result, Err(BackendError::Server { status: 500, .. })));
    assert!(snapshot.contains(ProductId::new(1)));
    assert_eq!(snapshot.quantity_of(ProductId::new(2)), Some(1));
}

#[tokio::test]
async fn test_login_reads_refresh_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "refreshToken=r9; Path=/; HttpOnly")
                .set_body_json(json!({"accessToken": "a9"})),
        )
        .mount(&server)
        .await;

    let tokens = client(&server).login("a@b.co", "secret123").await.unwrap();
    assert_eq!(tokens.access_token, "a9");
    assert_eq!(tokens.refresh_token.as_deref(), Some("r9"));
}

#[tokio::test]
async fn test_banner_upload_is_multipart_and_refreshes_banners() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/banners"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/admin/banners"))
        .and(header("authorization", "Bearer a1"))
        .and(body_string_contains("name=\"title\""))
        .and(body_string_contains("filename=\"spring.png\""))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let backend = client(&server);
    backend.banners().await.unwrap();
    let upload = BannerUpload {
        title: "Spring sale".to_string(),
        display_order: 1,
        target_url: Some("/categories/3".to_string()),
        image: Some(FilePart {
            file_name: "spring.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        }),
    };
    backend.create_banner(&logged_in("a1"), &upload).await.unwrap();
    backend.banners().await.unwrap();
}

//! Admin console against a running server.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use shopbag_integration_tests::{admin_url, client, credentials, location};

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_health_endpoint() {
    let resp = client()
        .get(format!("{}/health", admin_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_console_requires_login() {
    for path in ["/", "/products", "/categories", "/banners", "/coupons"] {
        let resp = client()
            .get(format!("{}{path}", admin_url()))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&resp).as_deref(), Some("/auth/login"), "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_admin_pages_are_never_cached() {
    let resp = client()
        .get(format!("{}/auth/login", admin_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["cache-control"], "no-store");
}

#[tokio::test]
#[ignore = "Requires running admin server, backend and TEST_MEMBER_* credentials"]
async fn test_member_account_is_refused() {
    let Some((email, password)) = credentials("TEST_MEMBER_EMAIL", "TEST_MEMBER_PASSWORD") else {
        return;
    };
    let resp = client()
        .post(format!("{}/auth/login", admin_url()))
        .form(&[("email", email.as_str()), ("password", password.as_str())])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("does not have admin access"));
}

#[tokio::test]
#[ignore = "Requires running admin server, backend and TEST_ADMIN_* credentials"]
async fn test_admin_can_browse_catalog() {
    let Some((email, password)) = credentials("TEST_ADMIN_EMAIL", "TEST_ADMIN_PASSWORD") else {
        return;
    };
    let client = client();
    let base = admin_url();

    let resp = client
        .post(format!("{base}/auth/login"))
        .form(&[("email", email.as_str()), ("password", password.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp).as_deref(), Some("/"));

    for path in [
        "/products?scope=categoryName&keyword=&sort=price&dir=asc",
        "/categories?view=tree",
        "/categories?view=order",
        "/banners",
    ] {
        let resp = client.get(format!("{base}{path}")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running admin server, backend and TEST_ADMIN_* credentials"]
async fn test_invalid_category_form_is_rerendered() {
    let Some((email, password)) = credentials("TEST_ADMIN_EMAIL", "TEST_ADMIN_PASSWORD") else {
        return;
    };
    let client = client();
    let base = admin_url();
    client
        .post(format!("{base}/auth/login"))
        .form(&[("email", email.as_str()), ("password", password.as_str())])
        .send()
        .await
        .unwrap();

    let form = reqwest::multipart::Form::new()
        .text("name", "Integration")
        .text("display_order", "0");
    let resp = client
        .post(format!("{base}/categories"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("at least 1"));
}

//! End-to-end tests for Shopbag.
//!
//! Every test is `#[ignore]`d: they need both binaries running against a
//! session database and a live commerce backend.
//!
//! ```bash
//! cargo run -p shopbag-cli -- migrate all
//! cargo run -p shopbag-storefront &
//! cargo run -p shopbag-admin &
//! cargo test -p shopbag-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_BASE_URL` (default `http://localhost:3000`)
//! - `ADMIN_BASE_URL` (default `http://localhost:3001`)
//! - `TEST_MEMBER_EMAIL` / `TEST_MEMBER_PASSWORD` - an ordinary member
//! - `TEST_ADMIN_EMAIL` / `TEST_ADMIN_PASSWORD` - a `ROLE_ADMIN` account

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use reqwest::Client;
use reqwest::redirect::Policy;

#[must_use]
pub fn storefront_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

#[must_use]
pub fn admin_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// Credentials from the environment, if the pair is set.
#[must_use]
pub fn credentials(email_var: &str, password_var: &str) -> Option<(String, String)> {
    Some((std::env::var(email_var).ok()?, std::env::var(password_var).ok()?))
}

/// A browser-like client: keeps cookies, does not follow redirects so tests
/// can assert on them.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// The `Location` header of a redirect response.
#[must_use]
pub fn location(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

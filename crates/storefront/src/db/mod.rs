//! Storefront `PostgreSQL` access.
//!
//! The database only holds visitor sessions (`tower_sessions.session`). Every
//! catalog, cart, coupon and order record lives in the commerce backend.
//!
//! # Migrations
//!
//! The session table is created by:
//! ```bash
//! cargo run -p shopbag-cli -- migrate storefront
//! ```

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Create a `PostgreSQL` connection pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

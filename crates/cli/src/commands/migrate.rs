//! Session table migrations.
//!
//! Both binaries keep sessions in `PostgreSQL` through
//! `tower-sessions-sqlx-store`. The tables are never created on startup;
//! these commands create them.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - storefront sessions,
//!   table `tower_sessions.session`
//! - `ADMIN_DATABASE_URL` - admin sessions, table `admin.session`

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use tower_sessions_sqlx_store::PostgresStore;

use super::{CommandError, required_env};

fn storefront_database_url() -> Result<SecretString, CommandError> {
    std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("STOREFRONT_DATABASE_URL"))
}

async fn connect(database_url: &SecretString) -> Result<PgPool, CommandError> {
    Ok(PgPool::connect(database_url.expose_secret()).await?)
}

/// Create the storefront session table.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the DDL fails.
pub async fn storefront() -> Result<(), CommandError> {
    let database_url = storefront_database_url()?;

    tracing::info!("Connecting to storefront database...");
    let pool = connect(&database_url).await?;

    tracing::info!("Creating storefront session table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Storefront migrations complete");
    Ok(())
}

/// Create the admin session table in the `admin` schema.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the DDL fails.
pub async fn admin() -> Result<(), CommandError> {
    let database_url = SecretString::from(required_env("ADMIN_DATABASE_URL")?);

    tracing::info!("Connecting to admin database...");
    let pool = connect(&database_url).await?;

    tracing::info!("Creating admin session table...");
    shopbag_admin::middleware::session::session_store(&pool)
        .migrate()
        .await?;

    tracing::info!("Admin migrations complete");
    Ok(())
}

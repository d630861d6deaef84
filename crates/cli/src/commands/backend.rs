//! Backend connectivity check.

use std::time::Duration;

use shopbag_backend::{BackendClient, BackendConfig};
use url::Url;

use super::{CommandError, required_env};

fn config_from_env() -> Result<BackendConfig, CommandError> {
    let raw = required_env("BACKEND_BASE_URL")?;
    let base_url =
        Url::parse(&raw)
            .map_err(|e| CommandError::InvalidEnvVar("BACKEND_BASE_URL", e.to_string()))?;
    let timeout_secs = std::env::var("BACKEND_TIMEOUT_SECS")
        .ok()
        .map(|v| v.parse::<u64>())
        .transpose()
        .map_err(|e| CommandError::InvalidEnvVar("BACKEND_TIMEOUT_SECS", e.to_string()))?
        .unwrap_or(10);
    Ok(BackendConfig {
        base_url,
        timeout: Duration::from_secs(timeout_secs),
    })
}

/// Call the backend's public category list and report how it went.
///
/// # Errors
///
/// Returns an error if the backend is unreachable or answers with an error.
pub async fn ping() -> Result<(), CommandError> {
    let config = config_from_env()?;
    tracing::info!(backend = %config.base_url, "Pinging backend...");

    let client = BackendClient::new(&config)?;
    client.ping().await?;

    tracing::info!("Backend is reachable");
    Ok(())
}

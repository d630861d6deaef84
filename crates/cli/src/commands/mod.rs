pub mod backend;
pub mod migrate;

use thiserror::Error;

/// Errors shared by every command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(&'static str, String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Backend error: {0}")]
    Backend(#[from] shopbag_backend::BackendError),
}

fn required_env(key: &'static str) -> Result<String, CommandError> {
    std::env::var(key).map_err(|_| CommandError::MissingEnvVar(key))
}

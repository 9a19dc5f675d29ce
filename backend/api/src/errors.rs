//! Application-wide error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Upstream gateway rejected a call; carries the diagnostic payload the
    /// gateway returned so handlers can surface it to the caller.
    #[error("Gateway error: {0}")]
    Gateway(serde_json::Value),
}

pub type Result<T> = std::result::Result<T, ApiError>;

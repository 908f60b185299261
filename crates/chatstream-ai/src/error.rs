//! Error types for the provider layer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, AiError>;

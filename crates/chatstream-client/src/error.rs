//! Error types for the client

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected status {0}")]
    UnexpectedStatus(reqwest::StatusCode),

    #[error(
        "send unavailable: input is empty, a request is in flight, or the client is rate limited"
    )]
    SendUnavailable,
}

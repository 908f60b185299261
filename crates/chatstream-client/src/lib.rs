//! Chatstream client - conversation state machine over the SSE chat protocol
//!
//! This crate provides:
//! - `ChatController`, the send/stream state machine
//! - `ApiClient`, a thin HTTP wrapper for the server endpoints
//! - Rate limit view state and countdown formatting

mod api_client;
mod controller;
pub mod error;
mod rate_limit;

pub use api_client::ApiClient;
pub use controller::{ChatController, Phase, SendOutcome};
pub use error::ClientError;
pub use rate_limit::{RateLimitState, format_countdown};

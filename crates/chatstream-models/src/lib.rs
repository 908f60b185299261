//! Chatstream shared models
//!
//! This crate provides:
//! - Chat message types shared by the server and client
//! - Wire-level stream event and HTTP body shapes
//! - A buffering SSE decoder for incremental stream parsing

pub mod message;
pub mod sse;
pub mod wire;

pub use message::{ChatMessage, ChatRole};
pub use sse::SseDecoder;
pub use wire::{ChatRequest, RateLimitExceeded, RateLimitStatus, StreamEvent};

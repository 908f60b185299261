//! Chatstream AI - streaming LLM provider abstraction
//!
//! This crate provides:
//! - `LlmClient`, the streaming provider trait the relay consumes
//! - An OpenAI-compatible streaming HTTP client
//! - A deterministic scripted mock client for tests and local runs

mod client;
pub mod error;
mod mock;
mod openai;

pub use client::{CompletionRequest, FinishReason, LlmClient, StreamChunk, StreamResult};
pub use error::{AiError, Result};
pub use mock::{MockLlmClient, MockStep, MockStepKind};
pub use openai::OpenAiClient;

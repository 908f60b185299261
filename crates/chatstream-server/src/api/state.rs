use std::sync::Arc;

use chatstream_ai::LlmClient;

use crate::rate_limit::RateLimiter;

/// Shared state handed to every handler.
///
/// Concurrent connections are independent; the limiters are the only state
/// they share.
#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn LlmClient>,
    pub chat_limiter: Arc<RateLimiter>,
    pub status_limiter: Arc<RateLimiter>,
}

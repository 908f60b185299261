use std::env;
use std::str::FromStr;

use chrono::Duration;

/// Which LLM backend the relay talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Mock,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub provider: ProviderKind,
    pub openai_api_key: String,
    pub openai_base_url: Option<String>,
    pub model: String,
    /// Requests per window on the chat endpoint
    pub chat_limit: u32,
    /// Requests per window on the status endpoint
    pub status_limit: u32,
    pub window_secs: i64,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let provider = match env::var("CHATSTREAM_PROVIDER").as_deref() {
            Ok("mock") => ProviderKind::Mock,
            _ => ProviderKind::OpenAi,
        };

        Self {
            host: env_or("CHATSTREAM_HOST", "0.0.0.0"),
            port: env_parse("CHATSTREAM_PORT", 3000),
            provider,
            openai_api_key: env_or("OPENAI_API_KEY", ""),
            openai_base_url: env::var("OPENAI_BASE_URL").ok(),
            model: env_or("CHATSTREAM_MODEL", "gpt-4o-mini"),
            chat_limit: env_parse("CHATSTREAM_CHAT_LIMIT", 1),
            status_limit: env_parse("CHATSTREAM_STATUS_LIMIT", 30),
            window_secs: env_parse("CHATSTREAM_WINDOW_SECS", 60),
        }
    }

    pub fn window(&self) -> Duration {
        Duration::seconds(self.window_secs)
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr + Copy>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

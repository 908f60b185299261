use std::net::SocketAddr;
use std::sync::Arc;

use chatstream_ai::{LlmClient, MockLlmClient, OpenAiClient};
use chatstream_server::api::state::AppState;
use chatstream_server::config::{ProviderKind, ServerConfig};
use chatstream_server::rate_limit::RateLimiter;

#[tokio::main]
async fn main() {
    // Initialize tracing logger
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,chatstream_server=debug".into()),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::from_env();

    let llm: Arc<dyn LlmClient> = match config.provider {
        ProviderKind::Mock => Arc::new(MockLlmClient::new(&config.model)),
        ProviderKind::OpenAi => {
            if config.openai_api_key.is_empty() {
                tracing::warn!("OPENAI_API_KEY is not set; provider calls will fail");
            }
            let mut client = OpenAiClient::new(&config.openai_api_key, &config.model);
            if let Some(base_url) = &config.openai_base_url {
                client = client.with_base_url(base_url);
            }
            Arc::new(client)
        }
    };

    tracing::info!(
        provider = llm.provider(),
        model = llm.model(),
        "Starting chatstream server"
    );

    let state = AppState {
        llm,
        chat_limiter: Arc::new(RateLimiter::new(config.chat_limit, config.window())),
        status_limiter: Arc::new(RateLimiter::new(config.status_limit, config.window())),
    };

    let app = chatstream_server::app(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind server address");

    tracing::info!("Chatstream running on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}

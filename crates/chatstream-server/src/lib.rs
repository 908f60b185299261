//! Chatstream server - SSE chat relay with per-client throttling

pub mod api;
pub mod config;
pub mod rate_limit;

use axum::{
    Json, Router,
    http::{Method, header},
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use api::state::AppState;

#[derive(serde::Serialize)]
struct Health {
    status: String,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
    })
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health))
        .route("/chat-stream", post(api::chat::chat_stream))
        .route("/rate-limit-status", get(api::status::rate_limit_status))
        .layer(cors)
        .with_state(state)
}

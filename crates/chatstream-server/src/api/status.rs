//! GET /rate-limit-status — read-only usage for the caller

use std::net::SocketAddr;

use axum::{
    Json,
    extract::{ConnectInfo, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chatstream_models::RateLimitStatus;
use chrono::Utc;
use serde_json::json;

use crate::api::state::AppState;

/// Reports the chat limiter's counters for the caller without consuming a
/// chat slot. The endpoint is itself throttled at a separate, higher
/// threshold.
pub async fn rate_limit_status(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Response {
    let client_id = addr.ip().to_string();
    let now = Utc::now();

    let gate = state.status_limiter.admit(&client_id, now);
    if !gate.allowed {
        tracing::debug!(client = %client_id, "status request rejected by rate limiter");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(gate.exceeded_body(now)),
        )
            .into_response();
    }

    match state.chat_limiter.status(&client_id, now) {
        Ok(snapshot) => Json(RateLimitStatus {
            is_rate_limited: snapshot.limited,
            limit: snapshot.limit,
            remaining: snapshot.remaining,
            reset_time: snapshot.reset_at.map(|at| at.to_rfc3339()),
        })
        .into_response(),
        Err(err) => {
            tracing::error!("rate limit status lookup failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to read rate limit status"})),
            )
                .into_response()
        }
    }
}

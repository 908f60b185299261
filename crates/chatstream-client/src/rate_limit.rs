//! Client-side rate limit view, refreshed from response headers.

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;

#[derive(Debug, Clone, Default)]
pub struct RateLimitState {
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: Option<DateTime<Utc>>,
    pub is_limited: bool,
}

impl RateLimitState {
    /// Refresh from response headers. Fields missing from the response keep
    /// their previous values; `is_limited` always reflects the last status.
    pub fn refresh(&mut self, headers: &HeaderMap, limited: bool) {
        if let Some(limit) = header_number(headers, "x-ratelimit-limit") {
            self.limit = limit;
        }
        if let Some(remaining) = header_number(headers, "x-ratelimit-remaining") {
            self.remaining = remaining;
        }
        if let Some(value) = headers
            .get("x-ratelimit-reset")
            .and_then(|value| value.to_str().ok())
            && let Ok(parsed) = DateTime::parse_from_rfc3339(value)
        {
            self.reset_at = Some(parsed.with_timezone(&Utc));
        }
        self.is_limited = limited;
    }

    /// Whether sends must stay blocked at `now`. A limit with no known reset
    /// time blocks until the next refresh says otherwise.
    pub fn is_blocked(&self, now: DateTime<Utc>) -> bool {
        self.is_limited && self.reset_at.is_none_or(|at| now < at)
    }

    /// Seconds until the current window resets, floored at zero.
    pub fn seconds_until_reset(&self, now: DateTime<Utc>) -> i64 {
        self.reset_at
            .map(|at| (at - now).num_seconds().max(0))
            .unwrap_or(0)
    }
}

fn header_number(headers: &HeaderMap, name: &str) -> Option<u32> {
    headers.get(name)?.to_str().ok()?.parse().ok()
}

/// Format a reset countdown for display
pub fn format_countdown(seconds: i64) -> String {
    if seconds >= 60 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}s", seconds)
    }
}

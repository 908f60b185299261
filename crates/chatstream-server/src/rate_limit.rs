//! Fixed-window request throttling keyed by client identifier.

use std::collections::HashMap;
use std::sync::Mutex;

use chatstream_models::RateLimitExceeded;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

const DEFAULT_RETRY_AFTER_MS: u64 = 60_000;

#[derive(Error, Debug)]
pub enum RateLimitError {
    #[error("rate limit store unavailable: {0}")]
    Store(String),
}

/// Outcome of an admission check
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl Decision {
    /// Milliseconds until the window resets, floored at a positive default
    /// when clock skew makes the remainder non-positive.
    pub fn retry_after_ms(&self, now: DateTime<Utc>) -> u64 {
        let remaining = (self.reset_at - now).num_milliseconds();
        if remaining > 0 {
            remaining as u64
        } else {
            DEFAULT_RETRY_AFTER_MS
        }
    }

    /// Structured 429 body for a rejected request
    pub fn exceeded_body(&self, now: DateTime<Utc>) -> RateLimitExceeded {
        RateLimitExceeded {
            error: "Rate limit exceeded. Please wait before sending another message.".to_string(),
            limit: self.limit,
            remaining: self.remaining,
            reset_time: Some(self.reset_at.to_rfc3339()),
            retry_after_ms: self.retry_after_ms(now),
        }
    }
}

/// Read-only view of a client's current usage
#[derive(Debug, Clone, PartialEq)]
pub struct UsageSnapshot {
    pub limited: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct WindowRecord {
    count: u32,
    window_start: DateTime<Utc>,
}

/// Fixed-window rate limiter with one counter per client identifier.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, WindowRecord>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Count one request against `client_id` and decide whether it may
    /// proceed. Check-and-increment happens under the store lock, so two
    /// concurrent admissions cannot both take the last slot.
    pub fn admit(&self, client_id: &str, now: DateTime<Utc>) -> Decision {
        let mut windows = self.windows.lock().expect("rate limit lock");
        let record = windows
            .entry(client_id.to_string())
            .or_insert(WindowRecord {
                count: 0,
                window_start: now,
            });

        if now >= record.window_start + self.window {
            record.count = 0;
            record.window_start = now;
        }
        record.count += 1;

        Decision {
            allowed: record.count <= self.max_requests,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(record.count),
            reset_at: record.window_start + self.window,
        }
    }

    /// Report current usage without counting a request. A store failure is
    /// reported as an error, never as "not limited".
    pub fn status(
        &self,
        client_id: &str,
        now: DateTime<Utc>,
    ) -> Result<UsageSnapshot, RateLimitError> {
        let windows = self
            .windows
            .lock()
            .map_err(|e| RateLimitError::Store(e.to_string()))?;

        let snapshot = match windows.get(client_id) {
            Some(record) if now < record.window_start + self.window => UsageSnapshot {
                limited: record.count >= self.max_requests,
                limit: self.max_requests,
                remaining: self.max_requests.saturating_sub(record.count),
                reset_at: Some(record.window_start + self.window),
            },
            // No record yet, or the window has already lapsed
            _ => UsageSnapshot {
                limited: false,
                limit: self.max_requests,
                remaining: self.max_requests,
                reset_at: None,
            },
        };
        Ok(snapshot)
    }
}

//! Fixed-window request throttling keyed by client IP

use crate::error::HttpError;
use crate::extract::client_ip;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

const CLEANUP_THRESHOLD: usize = 10_000;

/// Outcome of counting one request against the window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Requests seen in the current window, this one included
    pub current: u32,
    pub limit: u32,
    /// Seconds until the window resets
    pub reset_time: u64,
    pub allowed: bool,
}

impl RateLimitInfo {
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.current)
    }
}

#[derive(Debug, Default)]
struct InMemoryStorage {
    /// identifier -> (request_count, window_start)
    counters: HashMap<String, (u32, u64)>,
}

/// `max_requests` per `window_seconds` for each identifier
#[derive(Debug, Clone)]
pub struct RateLimiter {
    max_requests: u32,
    window_seconds: u64,
    storage: Arc<Mutex<InMemoryStorage>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self {
            max_requests,
            window_seconds: window_seconds.max(1),
            storage: Arc::new(Mutex::new(InMemoryStorage::default())),
        }
    }

    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, 60)
    }

    /// Count a request for `identifier` at the current time
    pub fn check(&self, identifier: &str) -> RateLimitInfo {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        self.check_at(identifier, now)
    }

    pub fn check_at(&self, identifier: &str, now: u64) -> RateLimitInfo {
        let mut storage = self
            .storage
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let (count, window_start) = storage
            .counters
            .get(identifier)
            .copied()
            .unwrap_or((0, now));

        let (count, window_start) = if now.saturating_sub(window_start) >= self.window_seconds {
            (1, now)
        } else {
            (count.saturating_add(1), window_start)
        };

        storage
            .counters
            .insert(identifier.to_string(), (count, window_start));

        if storage.counters.len() > CLEANUP_THRESHOLD {
            let window = self.window_seconds;
            storage
                .counters
                .retain(|_, &mut (_, start)| now.saturating_sub(start) < window * 2);
        }

        RateLimitInfo {
            current: count,
            limit: self.max_requests,
            reset_time: (window_start + self.window_seconds).saturating_sub(now),
            allowed: count <= self.max_requests,
        }
    }
}

/// Throttle the chatbot routes with the limiter held in [`AppState`]
pub async fn throttle_chatbot(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let identifier = client_ip(&request, &state.config.trusted_proxies).to_string();
    let info = state.chatbot_limiter.check(&identifier);

    if !info.allowed {
        tracing::warn!(client = %identifier, limit = info.limit, "Chatbot rate limit exceeded");
        let mut response = HttpError::too_many_requests(info.reset_time).into_response();
        let headers = response.headers_mut();
        headers.insert("retry-after", HeaderValue::from(info.reset_time));
        headers.insert("x-ratelimit-limit", HeaderValue::from(info.limit));
        headers.insert("x-ratelimit-remaining", HeaderValue::from(0u32));
        return response;
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", HeaderValue::from(info.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(info.remaining()));
    response
}

//! Keyed fixed-window rate limiting
//!
//! In-process replacement for the legacy file-backed counter: one mutex
//! over a window map, no shared files, safe under concurrent requests.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;

use crate::config::RateLimitConfig;
use crate::error::AppError;
use crate::AppState;

struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter keyed by client identifier
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_seconds),
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Admit or reject one request for `key`
    pub async fn try_acquire(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        // Bound the map: expired windows are dropped before inserting
        if windows.len() > 1024 {
            let window = self.window;
            windows.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count >= self.max_requests {
            false
        } else {
            entry.count += 1;
            true
        }
    }
}

/// Middleware applying the limiter to a route group, keyed by forwarded
/// client address when present
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let key = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.split(',').next().unwrap_or(s).trim().to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    if state.rate_limiter.try_acquire(&key).await {
        next.run(request).await
    } else {
        AppError::RateLimited.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max: u32, secs: u64) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            max_requests: max,
            window_seconds: secs,
        })
    }

    #[tokio::test]
    async fn admits_up_to_limit_then_rejects() {
        let limiter = limiter(3, 60);
        assert!(limiter.try_acquire("a").await);
        assert!(limiter.try_acquire("a").await);
        assert!(limiter.try_acquire("a").await);
        assert!(!limiter.try_acquire("a").await);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let limiter = limiter(1, 60);
        assert!(limiter.try_acquire("a").await);
        assert!(!limiter.try_acquire("a").await);
        assert!(limiter.try_acquire("b").await);
    }

    #[tokio::test]
    async fn window_resets_after_expiry() {
        let limiter = limiter(1, 0);
        assert!(limiter.try_acquire("a").await);
        // Zero-length window: the next call starts a fresh window
        assert!(limiter.try_acquire("a").await);
    }
}

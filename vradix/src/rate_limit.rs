//! Fixed-window request limiting per client IP.
//!
//! Each client key gets a counter that resets when its window expires. Increment and compare
//! happen under the map's shard lock for that key; concurrent requests at a window boundary may
//! land in either window.

use std::{
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tracing::{debug, instrument};

use crate::{config::RateLimitConfig, errors::Error};

/// Keys tracked before expired windows are swept
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    windows: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: DashMap::new(),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.requests_per_window, config.window)
    }

    /// Count one request for `key`; `false` when it exceeds the limit
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> bool {
        if self.windows.len() > SWEEP_THRESHOLD {
            self.sweep(now);
        }

        let mut entry = self.windows.entry(key.to_string()).or_insert(Window { started: now, count: 0 });
        if now.saturating_duration_since(entry.started) >= self.window {
            *entry = Window { started: now, count: 0 };
        }
        entry.count = entry.count.saturating_add(1);
        entry.count <= self.limit
    }

    /// Drop windows that have expired
    pub fn sweep(&self, now: Instant) {
        self.windows
            .retain(|_, window| now.saturating_duration_since(window.started) < self.window);
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

/// First `X-Forwarded-For` entry, else the peer address
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

#[instrument(skip_all)]
pub async fn rate_limit_middleware(State(limiter): State<Arc<RateLimiter>>, request: Request<Body>, next: Next) -> Response {
    let peer = request.extensions().get::<ConnectInfo<SocketAddr>>().map(|info| info.0);
    let key = client_key(request.headers(), peer);

    if !limiter.check(&key) {
        debug!(client = %key, "Rate limit exceeded");
        return Error::TooManyRequests.into_response();
    }

    next.run(request).await
}

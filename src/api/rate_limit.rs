//! Per-caller rate limiting.
//!
//! Fixed window per IP address. State lives in a `DashMap` so concurrent
//! requests from different callers never contend on a single lock.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::Config;
use crate::metrics;

/// Body returned with every 429.
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again after a minute.";

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

/// Outcome of one rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request may proceed.
    Allowed {
        /// Requests left in the current window.
        remaining: u32,
    },
    /// Request is over the limit.
    Exceeded {
        /// Time until the window resets.
        retry_after: Duration,
    },
}

/// Fixed-window request counter keyed by caller IP.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Arc<DashMap<IpAddr, Window>>,
}

impl RateLimiter {
    /// Allow `max_requests` per caller per `window`.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Arc::new(DashMap::new()),
        }
    }

    /// Limiter from `RATE_LIMIT_MAX_REQUESTS` / `RATE_LIMIT_WINDOW_SECS`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.rate_limit_max_requests, config.rate_limit_window())
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Count a request from `ip` and decide whether it may proceed.
    pub fn check(&self, ip: IpAddr) -> RateLimitDecision {
        self.check_at(ip, Instant::now())
    }

    fn check_at(&self, ip: IpAddr, now: Instant) -> RateLimitDecision {
        let mut entry = self.windows.entry(ip).or_insert(Window {
            count: 0,
            started: now,
        });

        if now.duration_since(entry.started) >= self.window {
            entry.count = 0;
            entry.started = now;
        }

        if entry.count >= self.max_requests {
            let reset_at = entry.started + self.window;
            return RateLimitDecision::Exceeded {
                retry_after: reset_at.saturating_duration_since(now),
            };
        }

        entry.count += 1;
        RateLimitDecision::Allowed {
            remaining: self.max_requests - entry.count,
        }
    }

    /// Drop windows that have expired. Call periodically.
    pub fn cleanup(&self) {
        let now = Instant::now();
        let window = self.window;
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.duration_since(w.started) < window);
        let removed = before.saturating_sub(self.windows.len());
        if removed > 0 {
            debug!(removed, "Expired rate-limit windows cleared");
        }
    }

    /// Number of callers currently tracked.
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}

/// Caller IP: socket peer when known, else the first `X-Forwarded-For` hop.
fn client_ip(connect_info: Option<&ConnectInfo<SocketAddr>>, headers: &HeaderMap) -> IpAddr {
    if let Some(ConnectInfo(addr)) = connect_info {
        return addr.ip();
    }
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Rate limiting middleware for the `/api` routes.
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(connect_info.as_ref(), request.headers());

    match limiter.check(ip) {
        RateLimitDecision::Allowed { .. } => next.run(request).await,
        RateLimitDecision::Exceeded { retry_after } => {
            let retry_secs = retry_after.as_secs_f64().ceil().max(1.0) as u64;
            warn!(ip = %ip, retry_after_secs = retry_secs, "Rate limit exceeded");
            metrics::inc_rate_limited();

            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_secs.to_string())],
                Json(json!({ "error": RATE_LIMIT_MESSAGE })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn allows_up_to_limit_then_rejects() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();

        assert_eq!(limiter.check_at(ip(1), now), RateLimitDecision::Allowed { remaining: 2 });
        assert_eq!(limiter.check_at(ip(1), now), RateLimitDecision::Allowed { remaining: 1 });
        assert_eq!(limiter.check_at(ip(1), now), RateLimitDecision::Allowed { remaining: 0 });
        assert!(matches!(
            limiter.check_at(ip(1), now),
            RateLimitDecision::Exceeded { .. }
        ));
    }

    #[test]
    fn callers_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(matches!(limiter.check_at(ip(1), now), RateLimitDecision::Allowed { .. }));
        assert!(matches!(limiter.check_at(ip(2), now), RateLimitDecision::Allowed { .. }));
        assert!(matches!(limiter.check_at(ip(1), now), RateLimitDecision::Exceeded { .. }));
        assert_eq!(limiter.tracked(), 2);
    }

    #[test]
    fn window_resets() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();

        assert!(matches!(limiter.check_at(ip(1), start), RateLimitDecision::Allowed { .. }));
        match limiter.check_at(ip(1), start + Duration::from_secs(45)) {
            RateLimitDecision::Exceeded { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(15))
            }
            other => panic!("expected Exceeded, got {:?}", other),
        }
        assert!(matches!(
            limiter.check_at(ip(1), start + Duration::from_secs(61)),
            RateLimitDecision::Allowed { .. }
        ));
    }

    #[test]
    fn cleanup_keeps_live_windows() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));
        limiter.check(ip(1));
        limiter.cleanup();
        assert_eq!(limiter.tracked(), 1);
    }

    #[test]
    fn forwarded_header_is_used_without_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        assert_eq!(
            client_ip(None, &headers),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );
        assert_eq!(
            client_ip(None, &HeaderMap::new()),
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        );
    }
}

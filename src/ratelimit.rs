//! Per-IP throttling of write requests
//!
//! Sliding window kept in memory. Only mutating methods (POST, PUT, PATCH,
//! DELETE) are counted, so page views and reads are never throttled. Login
//! attempts are POSTs and share the same budget.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

use crate::error::AppError;

#[derive(Clone)]
pub struct RateLimiter {
    requests: Arc<RwLock<HashMap<IpAddr, Vec<Instant>>>>,
    /// Requests allowed per window
    limit: u32,
    window: Duration,
    enabled: bool,
    /// Key on `X-Forwarded-For` instead of the peer address
    trust_forwarded_for: bool,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32, enabled: bool) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            limit: requests_per_minute,
            window: Duration::from_secs(60),
            enabled,
            trust_forwarded_for: false,
        }
    }

    /// Only enable behind a reverse proxy that overwrites the header
    pub fn trust_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }

    /// Check if a request is allowed and record it
    pub async fn check_and_record(&self, ip: IpAddr) -> bool {
        if !self.enabled {
            return true;
        }

        let now = Instant::now();
        let mut requests = self.requests.write().await;
        let timestamps = requests.entry(ip).or_default();

        timestamps.retain(|&t| now.duration_since(t) < self.window);

        if timestamps.len() >= self.limit as usize {
            return false;
        }

        timestamps.push(now);
        true
    }

    /// Forget windows with no recent requests; returns how many IPs were dropped
    pub async fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut requests = self.requests.write().await;
        let before = requests.len();

        requests.retain(|_, timestamps| {
            timestamps.retain(|&t| now.duration_since(t) < self.window);
            !timestamps.is_empty()
        });
        before - requests.len()
    }
}

fn is_write(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Client address: the peer, or the first `X-Forwarded-For` hop when the proxy is trusted
fn client_ip(request: &Request, peer: IpAddr, trust_forwarded_for: bool) -> IpAddr {
    if !trust_forwarded_for {
        return peer;
    }
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
        .unwrap_or(peer)
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    if !is_write(request.method()) {
        return next.run(request).await;
    }

    let ip = client_ip(&request, addr.ip(), limiter.trust_forwarded_for);
    if !limiter.check_and_record(ip).await {
        tracing::warn!(%ip, "Write rate limit exceeded");
        let mut response = AppError::RateLimited.into_response();
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from_static("60"));
        return response;
    }

    next.run(request).await
}

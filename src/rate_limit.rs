//! Per-client token buckets for throttling hot endpoints.
//!
//! Each client IP gets a bucket holding `capacity` tokens that refills at
//! `capacity` tokens per minute. A request takes one token; an empty bucket
//! rejects with the time until the next token is available.

use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRef, FromRequestParts},
    http::request::Parts,
};
use parking_lot::Mutex;
use tracing::warn;

use crate::{errors::AppError, state::AppState};

/// Buckets beyond this count trigger a sweep of the ones that have refilled.
const SWEEP_THRESHOLD: usize = 4096;

#[derive(Debug)]
struct TokenBucket {
    /// Available tokens, scaled by 1000.
    tokens_millis: u64,
    last_refill: Instant,
}

impl TokenBucket {
    fn full(capacity_millis: u64, now: Instant) -> Self {
        Self {
            tokens_millis: capacity_millis,
            last_refill: now,
        }
    }

    fn refill(&mut self, capacity_millis: u64, refill_per_sec: f64, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        let refill = (elapsed.as_secs_f64() * refill_per_sec * 1000.0) as u64;
        if refill > 0 {
            self.tokens_millis = self.tokens_millis.saturating_add(refill).min(capacity_millis);
            self.last_refill = now;
        }
    }
}

/// Keyed token-bucket limiter. Cheap to share behind an `Arc`.
#[derive(Debug)]
pub struct RateLimiter {
    capacity_millis: u64,
    refill_per_sec: f64,
    buckets: Mutex<HashMap<IpAddr, TokenBucket>>,
}

impl RateLimiter {
    /// Allows bursts of `per_minute` requests and the same sustained rate.
    pub fn per_minute(per_minute: u32) -> Self {
        let per_minute = per_minute.max(1);
        Self {
            capacity_millis: u64::from(per_minute) * 1000,
            refill_per_sec: f64::from(per_minute) / 60.0,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Takes one token for `client`, or returns how long until one is free.
    pub fn check(&self, client: IpAddr) -> Result<(), Duration> {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: IpAddr, now: Instant) -> Result<(), Duration> {
        let mut buckets = self.buckets.lock();
        if buckets.len() >= SWEEP_THRESHOLD {
            let (capacity, rate) = (self.capacity_millis, self.refill_per_sec);
            buckets.retain(|_, b| {
                b.refill(capacity, rate, now);
                b.tokens_millis < capacity
            });
        }

        let bucket = buckets
            .entry(client)
            .or_insert_with(|| TokenBucket::full(self.capacity_millis, now));
        bucket.refill(self.capacity_millis, self.refill_per_sec, now);

        if bucket.tokens_millis >= 1000 {
            bucket.tokens_millis -= 1000;
            return Ok(());
        }
        let deficit = 1000 - bucket.tokens_millis;
        let secs = deficit as f64 / (self.refill_per_sec * 1000.0);
        Err(Duration::from_secs_f64(secs).max(Duration::from_millis(1)))
    }
}

impl FromRef<AppState> for Arc<RateLimiter> {
    fn from_ref(state: &AppState) -> Self {
        state.me_limiter.clone()
    }
}

/// Admits the request against the caller's bucket. Place it before other
/// extractors so rejected calls do no further work.
#[derive(Debug, Clone, Copy)]
pub struct Throttled;

/// Peer address from the connection, or the unspecified address when the
/// router is driven without connect info.
fn client_ip(parts: &Parts) -> IpAddr {
    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

#[async_trait]
impl<S> FromRequestParts<S> for Throttled
where
    S: Send + Sync,
    Arc<RateLimiter>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ip = client_ip(parts);
        Arc::<RateLimiter>::from_ref(state)
            .check(ip)
            .map_err(|retry_after| {
                warn!(%ip, path = %parts.uri.path(), "rate limited");
                AppError::TooManyRequests {
                    retry_after_secs: retry_after.as_secs_f64().ceil() as u64,
                }
            })?;
        Ok(Throttled)
    }
}

//! Process-wide admission control.
//!
//! A single token bucket shared by every route and every caller. Rejection is
//! immediate; nothing queues or retries.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;

/// Admission capability injected into the request pipeline.
pub trait RateLimiter: Send + Sync {
    /// Try to take one unit of capacity. `false` means reject with 429.
    fn admit(&self) -> bool;
}

/// Limiter used when rate limiting is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unlimited;

impl RateLimiter for Unlimited {
    fn admit(&self) -> bool {
        true
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_update: Instant,
}

/// A token bucket refilled continuously up to `capacity`.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    /// Tokens per second.
    refill_rate: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Start full: `capacity` requests are admitted before any refill.
    pub fn new(capacity: u32, refill_tokens: u32, refill_interval: Duration) -> Self {
        let capacity = f64::from(capacity);
        let interval = refill_interval.as_secs_f64();
        let refill_rate = if interval > 0.0 {
            f64::from(refill_tokens) / interval
        } else {
            0.0
        };

        Self {
            capacity,
            refill_rate,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_update: Instant::now(),
            }),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config.capacity,
            config.refill_tokens,
            Duration::from_millis(config.refill_interval_ms),
        )
    }

    fn try_acquire_at(&self, now: Instant) -> bool {
        // A poisoned lock only means another request panicked mid-update; the
        // counters are still usable.
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let elapsed = now.saturating_duration_since(state.last_update).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_rate).min(self.capacity);
        state.last_update = now.max(state.last_update);

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

impl RateLimiter for TokenBucket {
    fn admit(&self) -> bool {
        let admitted = self.try_acquire_at(Instant::now());
        if !admitted {
            tracing::debug!(capacity = self.capacity, "Token bucket empty");
        }
        admitted
    }
}

//! Pacing between provider requests.
//!
//! A pacer is told when a unit of work has finished and blocks until the
//! next one may start. Fixed delays reproduce the provider quotas the
//! pipeline was tuned against (12s for news, 7s for market data); a token
//! bucket allows bursts up to a capacity while keeping the same long-run rate.

use crate::clock::Clock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub trait Pacer {
    /// Called after each unit of work, successful or not.
    fn pace(&mut self);
}

/// Configured pacing policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PacingPolicy {
    /// Sleep a fixed delay after every unit.
    Fixed { delay_secs: f64 },
    /// Allow `capacity` units per `refill_secs` window, refilled continuously.
    TokenBucket { capacity: u32, refill_secs: f64 },
    /// Never wait.
    None,
}

/// Longest delay or refill window a policy may ask for: one day.
pub const MAX_PACING_SECS: f64 = 86_400.0;

impl PacingPolicy {
    /// Reject delays and windows that are negative, not finite, or longer
    /// than [`MAX_PACING_SECS`].
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            PacingPolicy::Fixed { delay_secs } => check_secs("delay_secs", delay_secs),
            PacingPolicy::TokenBucket { refill_secs, .. } => {
                check_secs("refill_secs", refill_secs)
            }
            PacingPolicy::None => Ok(()),
        }
    }

    pub fn build(&self, clock: Arc<dyn Clock>) -> Box<dyn Pacer> {
        match *self {
            PacingPolicy::Fixed { delay_secs } => {
                Box::new(FixedDelay::new(secs(delay_secs), clock))
            }
            PacingPolicy::TokenBucket {
                capacity,
                refill_secs,
            } => Box::new(TokenBucket::new(capacity, secs(refill_secs), clock)),
            PacingPolicy::None => Box::new(NoPacing),
        }
    }
}

fn check_secs(field: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() {
        return Err(format!("{field} must be a finite number of seconds, got {value}"));
    }
    if value < 0.0 {
        return Err(format!("{field} must not be negative, got {value}"));
    }
    if value > MAX_PACING_SECS {
        return Err(format!("{field} must be at most {MAX_PACING_SECS}, got {value}"));
    }
    Ok(())
}

/// Seconds to a duration, clamped to `[0, MAX_PACING_SECS]`. Validated
/// configs never hit the clamp.
fn secs(value: f64) -> Duration {
    let max = Duration::from_secs(MAX_PACING_SECS as u64);
    if value.is_nan() || value <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(value).map_or(max, |d| d.min(max))
}

pub struct FixedDelay {
    delay: Duration,
    clock: Arc<dyn Clock>,
}

impl FixedDelay {
    pub fn new(delay: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { delay, clock }
    }
}

impl Pacer for FixedDelay {
    fn pace(&mut self) {
        if !self.delay.is_zero() {
            self.clock.sleep(self.delay);
        }
    }
}

pub struct TokenBucket {
    capacity: f64,
    tokens: f64,
    /// Tokens regained per second.
    rate: f64,
    last: Instant,
    clock: Arc<dyn Clock>,
}

impl TokenBucket {
    /// `capacity` units per `window`. A zero capacity or window disables waiting.
    pub fn new(capacity: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        let capacity = f64::from(capacity);
        let rate = if window.is_zero() {
            f64::INFINITY
        } else {
            capacity / window.as_secs_f64()
        };
        let last = clock.now();
        Self {
            capacity,
            tokens: capacity,
            rate,
            last,
            clock,
        }
    }

    fn refill(&mut self) {
        let now = self.clock.now();
        let gained = now.saturating_duration_since(self.last).as_secs_f64() * self.rate;
        self.tokens = (self.tokens + gained).min(self.capacity);
        self.last = now;
    }
}

impl Pacer for TokenBucket {
    fn pace(&mut self) {
        if self.capacity <= 0.0 || !self.rate.is_finite() {
            return;
        }
        self.refill();
        self.tokens -= 1.0;
        if self.tokens < 0.0 {
            let wait = secs(-self.tokens / self.rate);
            self.clock.sleep(wait);
            self.refill();
        }
    }
}

pub struct NoPacing;

impl Pacer for NoPacing {
    fn pace(&mut self) {}
}

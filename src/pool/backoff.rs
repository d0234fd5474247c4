//! Per-node exponential backoff state.
//!
//! # Responsibilities
//! - Compute the capped doubling delay curve
//! - Track one node's consecutive failures and eligibility window
//!
//! # Design Decisions
//! - State lives with the pool, not with a dispatch call, so backoff
//!   accumulates no matter how many separate requests are made
//! - Lock-free: atomic counters per node, no global lock
//! - No jitter: `blocked_until` is derived monotonically from the failure
//!   count and must never move backwards except on success

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::config::schema::BackoffConfig;

/// Backoff constants, fixed at pool construction.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    /// Delay after the first consecutive failure.
    pub base: Duration,
    /// Upper bound on the delay.
    pub max: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            max: Duration::from_secs(60),
        }
    }
}

impl From<&BackoffConfig> for BackoffPolicy {
    fn from(config: &BackoffConfig) -> Self {
        Self {
            base: Duration::from_millis(config.base_delay_ms),
            max: Duration::from_millis(config.max_delay_ms),
        }
    }
}

/// Calculate the backoff delay for the given consecutive-failure count.
pub fn calculate_backoff(failures: u32, base: Duration, max: Duration) -> Duration {
    if failures == 0 {
        return Duration::ZERO;
    }

    let exponent = 2u32.saturating_pow(failures - 1);
    base.saturating_mul(exponent).min(max)
}

/// Mutable backoff state for one node.
///
/// Timestamps are stored as millisecond offsets from a shared epoch so the
/// state fits in atomics.
#[derive(Debug)]
pub struct BackoffTracker {
    epoch: Instant,
    policy: BackoffPolicy,
    failures: AtomicU32,
    blocked_until_ms: AtomicU64,
}

impl BackoffTracker {
    pub fn new(epoch: Instant, policy: BackoffPolicy) -> Self {
        Self {
            epoch,
            policy,
            failures: AtomicU32::new(0),
            blocked_until_ms: AtomicU64::new(0),
        }
    }

    fn offset_ms(&self, at: Instant) -> u64 {
        at.saturating_duration_since(self.epoch).as_millis() as u64
    }

    /// True iff the node may be selected at `now`.
    pub fn is_eligible(&self, now: Instant) -> bool {
        self.offset_ms(now) >= self.blocked_until_ms.load(Ordering::Relaxed)
    }

    /// Earliest eligibility, as millis since the epoch. Used by the pool's
    /// soonest-available fallback.
    pub fn blocked_until_ms(&self) -> u64 {
        self.blocked_until_ms.load(Ordering::Relaxed)
    }

    /// Time left until the node becomes eligible; zero if it already is.
    pub fn eligible_in(&self, now: Instant) -> Duration {
        let blocked = self.blocked_until_ms.load(Ordering::Relaxed);
        Duration::from_millis(blocked.saturating_sub(self.offset_ms(now)))
    }

    /// Current consecutive-failure count.
    pub fn failure_count(&self) -> u32 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Record a connection failure: bump the count, push the eligibility
    /// window out. `fetch_max` keeps the window from ever moving backwards
    /// under concurrent updates.
    pub fn record_failure(&self, now: Instant) {
        let failures = self.failures.fetch_add(1, Ordering::Relaxed) + 1;
        let delay = calculate_backoff(failures, self.policy.base, self.policy.max);
        let until = self.offset_ms(now).saturating_add(delay.as_millis() as u64);
        self.blocked_until_ms.fetch_max(until, Ordering::Relaxed);
    }

    /// Record a success: the node is immediately eligible again.
    pub fn record_success(&self, now: Instant) {
        self.failures.store(0, Ordering::Relaxed);
        self.blocked_until_ms.store(self.offset_ms(now), Ordering::Relaxed);
    }
}

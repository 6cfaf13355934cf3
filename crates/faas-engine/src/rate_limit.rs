//! Per-tenant invocation rate limiting.
//!
//! Each tenant has two fixed windows, one minute and one hour long. Windows
//! are rotated lazily: the first attempt at or after a window's reset time
//! zeroes its counter and schedules the next reset one window length after
//! *that attempt*, not after the previous boundary.
//!
//! Check and increment happen under one lock, so concurrent attempts from
//! the same tenant can never overshoot a ceiling. Rejected attempts are not
//! counted.

use faas_core::{RateLimitConfig, TenantId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

/// Window counters observed by one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateUsage {
    /// Attempts counted in the current minute window.
    pub minute_count: u32,
    /// Per-minute ceiling.
    pub minute_limit: u32,
    /// Attempts counted in the current hour window.
    pub hour_count: u32,
    /// Per-hour ceiling.
    pub hour_limit: u32,
}

impl fmt::Display for RateUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} per minute, {}/{} per hour",
            self.minute_count, self.minute_limit, self.hour_count, self.hour_limit
        )
    }
}

/// Result of [`RateLimiter::try_acquire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// The attempt was counted; usage includes it.
    Allowed(RateUsage),
    /// A ceiling is reached; nothing was counted.
    Limited(RateUsage),
}

impl RateDecision {
    /// Returns `true` if the attempt may proceed.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed(_))
    }

    /// Usage after the decision.
    #[must_use]
    pub const fn usage(&self) -> RateUsage {
        match self {
            Self::Allowed(usage) | Self::Limited(usage) => *usage,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    minute_count: u32,
    minute_reset: Instant,
    hour_count: u32,
    hour_reset: Instant,
}

impl Window {
    fn new(now: Instant) -> Self {
        Self {
            minute_count: 0,
            minute_reset: now + MINUTE,
            hour_count: 0,
            hour_reset: now + HOUR,
        }
    }

    fn rotate(&mut self, now: Instant) {
        if now >= self.minute_reset {
            self.minute_count = 0;
            self.minute_reset = now + MINUTE;
        }
        if now >= self.hour_reset {
            self.hour_count = 0;
            self.hour_reset = now + HOUR;
        }
    }
}

/// Fixed-window limiter keyed by tenant.
///
/// # Examples
///
/// ```
/// use faas_core::{RateLimitConfig, TenantId};
/// use faas_engine::RateLimiter;
///
/// let limiter = RateLimiter::new(RateLimitConfig { per_minute: 2, per_hour: 10 });
/// let tenant = TenantId::new("acme");
///
/// assert!(limiter.try_acquire(&tenant).is_allowed());
/// assert!(limiter.try_acquire(&tenant).is_allowed());
/// assert!(!limiter.try_acquire(&tenant).is_allowed());
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<TenantId, Window>>,
}

impl RateLimiter {
    /// Creates a limiter with the given ceilings.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Configured ceilings.
    #[must_use]
    pub const fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Counts one attempt for `tenant` if both windows have room.
    pub fn try_acquire(&self, tenant: &TenantId) -> RateDecision {
        self.try_acquire_at(tenant, Instant::now())
    }

    /// [`try_acquire`](Self::try_acquire) with an explicit clock reading.
    pub fn try_acquire_at(&self, tenant: &TenantId, now: Instant) -> RateDecision {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let window = windows
            .entry(tenant.clone())
            .or_insert_with(|| Window::new(now));
        window.rotate(now);

        let allowed = window.minute_count < self.config.per_minute
            && window.hour_count < self.config.per_hour;
        if allowed {
            window.minute_count += 1;
            window.hour_count += 1;
        }

        let usage = RateUsage {
            minute_count: window.minute_count,
            minute_limit: self.config.per_minute,
            hour_count: window.hour_count,
            hour_limit: self.config.per_hour,
        };
        if allowed {
            RateDecision::Allowed(usage)
        } else {
            debug!(%tenant, %usage, "rate limit reached");
            RateDecision::Limited(usage)
        }
    }

    /// Number of tenants with a window.
    #[must_use]
    pub fn tracked_tenants(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

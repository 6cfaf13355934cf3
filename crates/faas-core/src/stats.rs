//! Engine statistics snapshots.
//!
//! Snapshots are plain serializable values captured from the engine's
//! counters; they can be exported as JSON for monitoring.
//!
//! # Examples
//!
//! ```
//! use faas_core::stats::ExecutionStats;
//!
//! let stats = ExecutionStats {
//!     total_invocations: 4,
//!     succeeded: 3,
//!     failed: 1,
//!     ..Default::default()
//! };
//! assert_eq!(stats.success_rate(), Some(0.75));
//! ```

use crate::TenantId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Point-in-time view of engine activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStats {
    /// When the snapshot was captured (UTC).
    pub snapshot_time: DateTime<Utc>,

    /// Invocations that reached the executor.
    pub total_invocations: u64,

    /// Invocations that exited with code 0.
    pub succeeded: u64,

    /// Invocations that did not succeed (including timeouts and
    /// infrastructure errors).
    pub failed: u64,

    /// Subset of `failed` that hit the wall-clock limit.
    pub timed_out: u64,

    /// Invocation attempts rejected by the rate limiter.
    pub rate_limited: u64,

    /// Executed invocations per tenant.
    pub per_tenant: BTreeMap<TenantId, u64>,

    /// Function definitions currently cached.
    pub cache_size: usize,

    /// Cache lookups answered from memory.
    pub cache_hits: u64,

    /// Cache lookups that fell through to storage.
    pub cache_misses: u64,

    /// Tenants with an active rate-limit window.
    pub rate_limited_tenants: usize,
}

impl ExecutionStats {
    /// Fraction of executed invocations that succeeded.
    ///
    /// Returns `None` before the first invocation.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> Option<f64> {
        if self.total_invocations == 0 {
            return None;
        }
        Some(self.succeeded as f64 / self.total_invocations as f64)
    }

    /// Fraction of cache lookups that hit.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cache_hit_rate(&self) -> Option<f64> {
        let lookups = self.cache_hits + self.cache_misses;
        if lookups == 0 {
            return None;
        }
        Some(self.cache_hits as f64 / lookups as f64)
    }
}

impl Default for ExecutionStats {
    fn default() -> Self {
        Self {
            snapshot_time: Utc::now(),
            total_invocations: 0,
            succeeded: 0,
            failed: 0,
            timed_out: 0,
            rate_limited: 0,
            per_tenant: BTreeMap::new(),
            cache_size: 0,
            cache_hits: 0,
            cache_misses: 0,
            rate_limited_tenants: 0,
        }
    }
}

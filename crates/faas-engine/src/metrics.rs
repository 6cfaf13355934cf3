//! Invocation counters.

use chrono::Utc;
use faas_core::stats::ExecutionStats;
use faas_core::{ExecutionStatus, TenantId};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Engine-wide invocation counters.
#[derive(Debug, Default)]
pub struct Metrics {
    total: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
    rate_limited: AtomicU64,
    per_tenant: Mutex<HashMap<TenantId, u64>>,
}

impl Metrics {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a finished invocation.
    pub fn record_execution(&self, tenant: &TenantId, status: ExecutionStatus) {
        self.total.fetch_add(1, Ordering::Relaxed);
        match status {
            ExecutionStatus::Succeeded => &self.succeeded,
            ExecutionStatus::Failed | ExecutionStatus::InfrastructureError => &self.failed,
            ExecutionStatus::TimedOut => {
                self.timed_out.fetch_add(1, Ordering::Relaxed);
                &self.failed
            }
        }
        .fetch_add(1, Ordering::Relaxed);

        *self
            .per_tenant
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(tenant.clone())
            .or_default() += 1;
    }

    /// Counts an attempt rejected by the rate limiter.
    pub fn record_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    /// Captures the invocation counters. Cache and limiter fields are left
    /// at zero for the caller to fill in.
    #[must_use]
    pub fn snapshot(&self) -> ExecutionStats {
        let per_tenant: BTreeMap<TenantId, u64> = self
            .per_tenant
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(tenant, count)| (tenant.clone(), *count))
            .collect();

        ExecutionStats {
            snapshot_time: Utc::now(),
            total_invocations: self.total.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            per_tenant,
            ..ExecutionStats::default()
        }
    }
}

//! Per-function resource policy.
//!
//! A [`ResourcePolicy`] is fixed when a function is created: per-field
//! overrides from the request are applied on top of the configured defaults
//! and must stay inside the platform [`ResourceCaps`].

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Resource limits applied to every invocation of a function.
///
/// # Examples
///
/// ```
/// use faas_core::ResourcePolicy;
///
/// let policy = ResourcePolicy::default();
/// assert_eq!(policy.cpu_limit, 1);
/// assert_eq!(policy.memory_limit_mb, 512);
/// assert_eq!(policy.timeout().as_secs(), 30);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcePolicy {
    /// CPU cores the process may run on.
    pub cpu_limit: u32,
    /// Memory ceiling in megabytes.
    pub memory_limit_mb: u32,
    /// Wall-clock limit in seconds.
    pub timeout_secs: u32,
}

impl ResourcePolicy {
    /// Default CPU cores.
    pub const DEFAULT_CPU_LIMIT: u32 = 1;
    /// Default memory ceiling in MB.
    pub const DEFAULT_MEMORY_LIMIT_MB: u32 = 512;
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u32 = 30;

    /// Returns the wall-clock limit as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs as u64)
    }

    /// Memory ceiling in bytes.
    #[must_use]
    pub const fn memory_limit_bytes(&self) -> u64 {
        self.memory_limit_mb as u64 * 1024 * 1024
    }

    /// Applies `overrides` on top of `self` and checks the result against `caps`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] naming the first field outside its cap.
    ///
    /// # Examples
    ///
    /// ```
    /// use faas_core::{ResourceCaps, ResourceOverrides, ResourcePolicy};
    ///
    /// let caps = ResourceCaps::default();
    /// let overrides = ResourceOverrides { timeout_secs: Some(5), ..Default::default() };
    /// let policy = ResourcePolicy::default().with_overrides(&overrides, &caps).unwrap();
    /// assert_eq!(policy.timeout_secs, 5);
    ///
    /// let too_big = ResourceOverrides { memory_limit_mb: Some(1 << 20), ..Default::default() };
    /// assert!(ResourcePolicy::default().with_overrides(&too_big, &caps).is_err());
    /// ```
    pub fn with_overrides(&self, overrides: &ResourceOverrides, caps: &ResourceCaps) -> Result<Self> {
        let policy = Self {
            cpu_limit: overrides.cpu_limit.unwrap_or(self.cpu_limit),
            memory_limit_mb: overrides.memory_limit_mb.unwrap_or(self.memory_limit_mb),
            timeout_secs: overrides.timeout_secs.unwrap_or(self.timeout_secs),
        };
        caps.check(&policy)?;
        Ok(policy)
    }
}

impl Default for ResourcePolicy {
    fn default() -> Self {
        Self {
            cpu_limit: Self::DEFAULT_CPU_LIMIT,
            memory_limit_mb: Self::DEFAULT_MEMORY_LIMIT_MB,
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl fmt::Display for ResourcePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cpu={} memory={}MB timeout={}s",
            self.cpu_limit, self.memory_limit_mb, self.timeout_secs
        )
    }
}

/// Optional per-field overrides supplied at creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceOverrides {
    /// CPU cores.
    pub cpu_limit: Option<u32>,
    /// Memory ceiling in MB.
    pub memory_limit_mb: Option<u32>,
    /// Timeout in seconds.
    pub timeout_secs: Option<u32>,
}

/// Platform hard caps for resource policies (inclusive ranges).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceCaps {
    /// Allowed CPU cores.
    pub cpu_limit: RangeInclusive<u32>,
    /// Allowed memory in MB.
    pub memory_limit_mb: RangeInclusive<u32>,
    /// Allowed timeout in seconds.
    pub timeout_secs: RangeInclusive<u32>,
}

impl Default for ResourceCaps {
    fn default() -> Self {
        Self {
            cpu_limit: 1..=8,
            memory_limit_mb: 128..=8192,
            timeout_secs: 1..=300,
        }
    }
}

impl ResourceCaps {
    /// Checks every field of `policy` against the caps.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] for the first field out of range.
    pub fn check(&self, policy: &ResourcePolicy) -> Result<()> {
        check_range("cpu_limit", policy.cpu_limit, &self.cpu_limit, "cores")?;
        check_range(
            "memory_limit_mb",
            policy.memory_limit_mb,
            &self.memory_limit_mb,
            "MB",
        )?;
        check_range("timeout_secs", policy.timeout_secs, &self.timeout_secs, "seconds")
    }
}

fn check_range(field: &str, value: u32, range: &RangeInclusive<u32>, unit: &str) -> Result<()> {
    if range.contains(&value) {
        return Ok(());
    }
    Err(Error::ValidationError {
        field: field.to_string(),
        reason: format!(
            "must be between {} and {} {unit}, got {value}",
            range.start(),
            range.end()
        ),
    })
}

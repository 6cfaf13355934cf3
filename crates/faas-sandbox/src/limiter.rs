//! Resource limit enforcement for interpreter processes.
//!
//! A [`ResourceLimiter`] turns a [`ResourcePolicy`] into settings on the
//! command about to be spawned and reports which mechanisms it applied.
//!
//! | Mechanism | Platform | Applies to |
//! |-----------|----------|------------|
//! | `v8-heap` (`--max-old-space-size`) | all | JavaScript |
//! | `rlimit-as` | Unix | Python |
//! | `rlimit-cpu` (timeout + 1 s) | Unix | all |
//! | `rlimit-core`, `rlimit-fsize` | Unix | all |
//! | `cpu-affinity` | Linux | all |
//!
//! `RLIMIT_AS` is not used for JavaScript: V8 reserves far more address
//! space than it commits and fails to start under realistic limits.

#![allow(unsafe_code)]

use faas_core::{Enforcement, Language, ResourcePolicy, SandboxConfig};
use std::fmt;
use std::sync::Arc;
use tokio::process::Command;

/// Largest file user code may create.
pub const MAX_FILE_BYTES: u64 = 16 * 1024 * 1024;

/// Applies resource limits to an interpreter command.
///
/// `apply` runs after the interpreter program is set and before the script
/// path is appended, so limiters may add interpreter flags.
pub trait ResourceLimiter: Send + Sync + fmt::Debug {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Configures `command` and returns what was enforced.
    fn apply(
        &self,
        command: &mut Command,
        language: Language,
        policy: &ResourcePolicy,
    ) -> Enforcement;
}

/// Enforces nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLimiter;

impl ResourceLimiter for NoopLimiter {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn apply(
        &self,
        _command: &mut Command,
        _language: Language,
        _policy: &ResourcePolicy,
    ) -> Enforcement {
        Enforcement::none()
    }
}

/// Enforces everything the host platform supports.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformLimiter;

impl ResourceLimiter for PlatformLimiter {
    fn name(&self) -> &'static str {
        "platform"
    }

    fn apply(
        &self,
        command: &mut Command,
        language: Language,
        policy: &ResourcePolicy,
    ) -> Enforcement {
        let mut enforcement = Enforcement::none();

        if language == Language::JavaScript {
            command.arg(format!("--max-old-space-size={}", policy.memory_limit_mb));
            enforcement.push("v8-heap");
        }

        #[cfg(unix)]
        unix::apply(command, language, policy, &mut enforcement);

        enforcement
    }
}

/// Limiter selected by the sandbox configuration.
#[must_use]
pub fn default_limiter(config: &SandboxConfig) -> Arc<dyn ResourceLimiter> {
    if config.enforce_limits {
        Arc::new(PlatformLimiter)
    } else {
        Arc::new(NoopLimiter)
    }
}

#[cfg(unix)]
mod unix {
    use super::MAX_FILE_BYTES;
    use faas_core::{Enforcement, Language, ResourcePolicy};
    use tokio::process::Command;
    use tracing::debug;

    pub(super) fn apply(
        command: &mut Command,
        language: Language,
        policy: &ResourcePolicy,
        enforcement: &mut Enforcement,
    ) {
        let mut limits = Vec::with_capacity(4);

        if language == Language::Python {
            limits.push((libc::RLIMIT_AS, policy.memory_limit_bytes()));
            enforcement.push("rlimit-as");
        }
        limits.push((libc::RLIMIT_CPU, libc::rlim_t::from(policy.timeout_secs) + 1));
        enforcement.push("rlimit-cpu");
        limits.push((libc::RLIMIT_CORE, 0));
        enforcement.push("rlimit-core");
        limits.push((libc::RLIMIT_FSIZE, MAX_FILE_BYTES));
        enforcement.push("rlimit-fsize");

        #[cfg(target_os = "linux")]
        let affinity = {
            let set = affinity::restricted(policy.cpu_limit);
            if set.is_some() {
                enforcement.push("cpu-affinity");
            }
            set
        };

        debug!(?limits, %enforcement, "configured process limits");

        // SAFETY: the closure runs in the forked child before exec. It only
        // calls async-signal-safe functions (setrlimit, sched_setaffinity)
        // on data prepared in the parent and does not allocate.
        unsafe {
            command.pre_exec(move || {
                for &(resource, value) in &limits {
                    let limit = libc::rlimit {
                        rlim_cur: value,
                        rlim_max: value,
                    };
                    libc::setrlimit(resource, &limit);
                }
                #[cfg(target_os = "linux")]
                if let Some(set) = &affinity {
                    libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), set);
                }
                Ok(())
            });
        }
    }

    #[cfg(target_os = "linux")]
    pub(super) mod affinity {
        use std::mem;

        /// CPUs the current process may run on, in index order.
        pub fn available() -> Vec<usize> {
            // SAFETY: cpu_set_t is plain data and zero is a valid empty set;
            // sched_getaffinity writes at most size_of::<cpu_set_t>() bytes.
            unsafe {
                let mut set: libc::cpu_set_t = mem::zeroed();
                if libc::sched_getaffinity(0, mem::size_of::<libc::cpu_set_t>(), &mut set) != 0 {
                    return Vec::new();
                }
                let size = usize::try_from(libc::CPU_SETSIZE).unwrap_or(0);
                (0..size)
                    .filter(|&cpu| libc::CPU_ISSET(cpu, &set))
                    .collect()
            }
        }

        /// A set holding the first `count` available CPUs.
        ///
        /// Returns `None` when the process already has `count` CPUs or
        /// fewer, or when the current set cannot be read.
        pub fn restricted(count: u32) -> Option<libc::cpu_set_t> {
            let available = available();
            let count = usize::try_from(count).ok()?.max(1);
            if available.is_empty() || available.len() <= count {
                return None;
            }
            // SAFETY: see `available`; CPU_SET only writes inside the set.
            unsafe {
                let mut set: libc::cpu_set_t = mem::zeroed();
                for &cpu in available.iter().take(count) {
                    libc::CPU_SET(cpu, &mut set);
                }
                Some(set)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(command: &Command) -> Vec<String> {
        command
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_noop_enforces_nothing() {
        let mut command = Command::new("python3");
        let enforcement =
            NoopLimiter.apply(&mut command, Language::Python, &ResourcePolicy::default());
        assert!(!enforcement.is_enforced());
        assert!(args(&command).is_empty());
    }

    #[test]
    fn test_javascript_heap_flag() {
        let mut command = Command::new("node");
        let policy = ResourcePolicy {
            memory_limit_mb: 256,
            ..ResourcePolicy::default()
        };
        let enforcement = PlatformLimiter.apply(&mut command, Language::JavaScript, &policy);
        assert_eq!(args(&command), vec!["--max-old-space-size=256"]);
        assert!(enforcement.mechanisms.contains(&"v8-heap".to_string()));
        assert!(!enforcement.mechanisms.contains(&"rlimit-as".to_string()));
    }

    #[test]
    fn test_python_has_no_interpreter_flags() {
        let mut command = Command::new("python3");
        let enforcement =
            PlatformLimiter.apply(&mut command, Language::Python, &ResourcePolicy::default());
        assert!(args(&command).is_empty());
        assert!(!enforcement.mechanisms.contains(&"v8-heap".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn test_unix_rlimits_reported() {
        let mut command = Command::new("python3");
        let enforcement =
            PlatformLimiter.apply(&mut command, Language::Python, &ResourcePolicy::default());
        for mechanism in ["rlimit-as", "rlimit-cpu", "rlimit-core", "rlimit-fsize"] {
            assert!(
                enforcement.mechanisms.contains(&mechanism.to_string()),
                "missing {mechanism} in {enforcement}"
            );
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_affinity_restricts_to_prefix() {
        let available = unix::affinity::available();
        if available.len() < 2 {
            return;
        }
        let set = unix::affinity::restricted(1).unwrap();
        // SAFETY: reading a fully initialized cpu_set_t.
        let chosen: Vec<usize> = available
            .iter()
            .copied()
            .filter(|&cpu| unsafe { libc::CPU_ISSET(cpu, &set) })
            .collect();
        assert_eq!(chosen, vec![available[0]]);
        assert!(unix::affinity::restricted(u32::try_from(available.len()).unwrap()).is_none());
    }

    #[test]
    fn test_default_limiter_follows_config() {
        let enforced = default_limiter(&SandboxConfig::default());
        assert_eq!(enforced.name(), "platform");

        let config = SandboxConfig {
            enforce_limits: false,
            ..SandboxConfig::default()
        };
        assert_eq!(default_limiter(&config).name(), "noop");
    }
}

//! Execution request/outcome types exchanged with a [`CodeExecutor`].
//!
//! [`CodeExecutor`]: crate::traits::CodeExecutor

use crate::{Language, ResourcePolicy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Terminal state of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// The process exited with code 0.
    Succeeded,
    /// The process exited non-zero or was killed by a signal.
    Failed,
    /// The process exceeded its wall-clock limit and was killed.
    TimedOut,
    /// The platform could not prepare or start the process.
    InfrastructureError,
}

impl ExecutionStatus {
    /// Returns `true` only for [`ExecutionStatus::Succeeded`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Canonical snake-case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
            Self::InfrastructureError => "infrastructure_error",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the platform actually enforced for one process.
///
/// The requested policy is always recorded next to this so an audit can tell
/// intent from enforcement on platforms without limit support.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enforcement {
    /// Mechanisms that were applied, e.g. `rlimit-as`, `cpu-affinity`.
    pub mechanisms: Vec<String>,
}

impl Enforcement {
    /// No limits were enforced.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            mechanisms: Vec::new(),
        }
    }

    /// Records an applied mechanism.
    pub fn push(&mut self, mechanism: impl Into<String>) {
        self.mechanisms.push(mechanism.into());
    }

    /// Returns `true` if at least one mechanism was applied.
    #[must_use]
    pub fn is_enforced(&self) -> bool {
        !self.mechanisms.is_empty()
    }
}

impl fmt::Display for Enforcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mechanisms.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&self.mechanisms.join(","))
        }
    }
}

/// A single invocation handed to an executor.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionRequest<'a> {
    /// Dialect of `source`.
    pub language: Language,
    /// Sanitized source as stored with the function.
    pub source: &'a str,
    /// Raw input payload, delivered through the input environment variable.
    pub input: &'a str,
    /// Limits for this run.
    pub policy: ResourcePolicy,
}

/// Everything an executor observed about one run.
///
/// Executors never fail: infrastructure problems are reported with
/// [`ExecutionStatus::InfrastructureError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Terminal state.
    pub status: ExecutionStatus,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Process exit code, when the process exited normally.
    pub exit_code: Option<i32>,
    /// Platform message describing a non-success status.
    pub message: Option<String>,
    /// Wall-clock duration of the run.
    pub duration: Duration,
    /// Limits the platform applied.
    pub enforcement: Enforcement,
}

impl ExecutionOutcome {
    /// Outcome for a run that never got a process.
    #[must_use]
    pub fn infrastructure_error(message: impl fmt::Display, duration: Duration) -> Self {
        Self {
            status: ExecutionStatus::InfrastructureError,
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
            message: Some(format!("Execution failed: {message}")),
            duration,
            enforcement: Enforcement::none(),
        }
    }

    /// Error text to persist: stderr, followed by the platform message.
    ///
    /// # Examples
    ///
    /// ```
    /// use faas_core::ExecutionOutcome;
    /// use std::time::Duration;
    ///
    /// let outcome = ExecutionOutcome::infrastructure_error("no such file", Duration::ZERO);
    /// assert_eq!(outcome.error_text(), "Execution failed: no such file");
    /// ```
    #[must_use]
    pub fn error_text(&self) -> String {
        let stderr = self.stderr.trim_end();
        match (&self.message, stderr.is_empty()) {
            (Some(message), true) => message.clone(),
            (Some(message), false) => format!("{stderr}\n{message}"),
            (None, _) => stderr.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(status: ExecutionStatus, stderr: &str, message: Option<&str>) -> ExecutionOutcome {
        ExecutionOutcome {
            status,
            stdout: String::new(),
            stderr: stderr.to_string(),
            exit_code: None,
            message: message.map(str::to_string),
            duration: Duration::from_millis(5),
            enforcement: Enforcement::none(),
        }
    }

    #[test]
    fn test_status_success_flag() {
        assert!(ExecutionStatus::Succeeded.is_success());
        assert!(!ExecutionStatus::Failed.is_success());
        assert!(!ExecutionStatus::TimedOut.is_success());
        assert!(!ExecutionStatus::InfrastructureError.is_success());
    }

    #[test]
    fn test_status_serde_names() {
        let json = serde_json::to_string(&ExecutionStatus::TimedOut).unwrap();
        assert_eq!(json, "\"timed_out\"");
    }

    #[test]
    fn test_error_text_combines_stderr_and_message() {
        let o = outcome(
            ExecutionStatus::Failed,
            "Traceback...\n",
            Some("Process exited with code 1"),
        );
        assert_eq!(o.error_text(), "Traceback...\nProcess exited with code 1");
    }

    #[test]
    fn test_error_text_stderr_only() {
        let o = outcome(ExecutionStatus::Succeeded, "warning", None);
        assert_eq!(o.error_text(), "warning");
    }

    #[test]
    fn test_enforcement_display() {
        let mut e = Enforcement::none();
        assert_eq!(e.to_string(), "none");
        assert!(!e.is_enforced());
        e.push("rlimit-as");
        e.push("cpu-affinity");
        assert_eq!(e.to_string(), "rlimit-as,cpu-affinity");
        assert!(e.is_enforced());
    }
}

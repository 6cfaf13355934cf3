//! Persisted entities: function definitions and execution records.

use crate::{
    Enforcement, ExecutionId, ExecutionOutcome, ExecutionStatus, FunctionId, Language,
    ResourceOverrides, ResourcePolicy, TenantId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored, validated function.
///
/// `source` is the sanitized source returned by the validator, never the raw
/// submission. The owner never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    /// Unique id.
    pub id: FunctionId,
    /// Owning tenant.
    pub tenant: TenantId,
    /// Human-readable name.
    pub name: String,
    /// Dialect.
    pub language: Language,
    /// Sanitized source.
    pub source: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Limits applied to every invocation.
    pub policy: ResourcePolicy,
}

impl Function {
    /// Returns `true` if `tenant` owns this function.
    #[must_use]
    pub fn is_owned_by(&self, tenant: &TenantId) -> bool {
        &self.tenant == tenant
    }
}

/// A creation request, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFunction {
    /// Human-readable name.
    pub name: String,
    /// Dialect.
    pub language: Language,
    /// Raw source as submitted.
    pub source: String,
    /// Optional per-field limit overrides.
    #[serde(default)]
    pub overrides: ResourceOverrides,
}

impl NewFunction {
    /// Creates a request with default limits.
    #[must_use]
    pub fn new(name: impl Into<String>, language: Language, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language,
            source: source.into(),
            overrides: ResourceOverrides::default(),
        }
    }

    /// Sets limit overrides.
    #[must_use]
    pub const fn with_overrides(mut self, overrides: ResourceOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// Immutable record of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Unique id.
    pub id: ExecutionId,
    /// Function that was invoked.
    pub function_id: FunctionId,
    /// Completion time.
    pub timestamp: DateTime<Utc>,
    /// Input payload as received.
    pub input: String,
    /// Captured standard output.
    pub output: String,
    /// Captured standard error and platform messages.
    pub error: String,
    /// `true` iff `status` is succeeded.
    pub success: bool,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Terminal state.
    pub status: ExecutionStatus,
    /// Policy requested for this run.
    pub policy: ResourcePolicy,
    /// Limits the platform applied.
    #[serde(default)]
    pub enforcement: Enforcement,
}

impl ExecutionRecord {
    /// Builds the record for a finished run of `function`.
    #[must_use]
    pub fn from_outcome(function: &Function, input: &str, outcome: &ExecutionOutcome) -> Self {
        Self {
            id: ExecutionId::new(),
            function_id: function.id,
            timestamp: Utc::now(),
            input: input.to_string(),
            output: outcome.stdout.clone(),
            error: outcome.error_text(),
            success: outcome.status.is_success(),
            duration_ms: u64::try_from(outcome.duration.as_millis()).unwrap_or(u64::MAX),
            status: outcome.status,
            policy: function.policy,
            enforcement: outcome.enforcement.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn function() -> Function {
        Function {
            id: FunctionId::new(),
            tenant: TenantId::new("acme"),
            name: "echo".to_string(),
            language: Language::Python,
            source: "print(event)".to_string(),
            created_at: Utc::now(),
            policy: ResourcePolicy::default(),
        }
    }

    #[test]
    fn test_ownership() {
        let f = function();
        assert!(f.is_owned_by(&TenantId::new("acme")));
        assert!(!f.is_owned_by(&TenantId::new("other")));
    }

    #[test]
    fn test_record_from_timeout_outcome() {
        let f = function();
        let outcome = ExecutionOutcome {
            status: ExecutionStatus::TimedOut,
            stdout: "partial".to_string(),
            stderr: String::new(),
            exit_code: None,
            message: Some("Execution timed out after 1s".to_string()),
            duration: Duration::from_millis(1003),
            enforcement: Enforcement::none(),
        };
        let record = ExecutionRecord::from_outcome(&f, "{}", &outcome);
        assert_eq!(record.function_id, f.id);
        assert!(!record.success);
        assert_eq!(record.status, ExecutionStatus::TimedOut);
        assert_eq!(record.duration_ms, 1003);
        assert_eq!(record.output, "partial");
        assert!(record.error.contains("timed out"));
        assert_eq!(record.policy, f.policy);
    }

    #[test]
    fn test_new_function_defaults() {
        let req = NewFunction::new("f", Language::JavaScript, "console.log(1)");
        assert_eq!(req.overrides, ResourceOverrides::default());
    }

    #[test]
    fn test_record_json_roundtrip() {
        let f = function();
        let outcome = ExecutionOutcome::infrastructure_error("spawn failed", Duration::ZERO);
        let record = ExecutionRecord::from_outcome(&f, "{\"x\":1}", &outcome);
        let json = serde_json::to_string(&record).unwrap();
        let back: ExecutionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }
}

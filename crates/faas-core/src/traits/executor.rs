//! Code execution trait.

use crate::{ExecutionOutcome, ExecutionRequest};
use async_trait::async_trait;

/// Runs one invocation of a function.
///
/// Implementations must be `Send + Sync` so a single executor can serve
/// concurrent invocations. `execute` never fails: problems preparing or
/// starting the process are reported as an
/// [`ExecutionStatus::InfrastructureError`](crate::ExecutionStatus::InfrastructureError)
/// outcome so the caller can record them.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use faas_core::traits::CodeExecutor;
/// use faas_core::{Enforcement, ExecutionOutcome, ExecutionRequest, ExecutionStatus};
/// use std::time::Duration;
///
/// struct Echo;
///
/// #[async_trait]
/// impl CodeExecutor for Echo {
///     async fn execute(&self, request: ExecutionRequest<'_>) -> ExecutionOutcome {
///         ExecutionOutcome {
///             status: ExecutionStatus::Succeeded,
///             stdout: request.input.to_string(),
///             stderr: String::new(),
///             exit_code: Some(0),
///             message: None,
///             duration: Duration::ZERO,
///             enforcement: Enforcement::none(),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    /// Executes `request` and reports what happened.
    async fn execute(&self, request: ExecutionRequest<'_>) -> ExecutionOutcome;
}

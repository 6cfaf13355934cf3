//! Persistence trait for functions and execution records.

use crate::{ExecutionRecord, Function, FunctionId, Result, TenantId};
use async_trait::async_trait;

/// Durable storage for function definitions and their execution history.
///
/// Ownership checks are the engine's job; the store answers by id only.
///
/// # Errors
///
/// All methods return [`Error::StorageError`](crate::Error::StorageError)
/// when the backing medium fails.
#[async_trait]
pub trait FunctionStore: Send + Sync {
    /// Inserts or replaces a function definition.
    async fn save_function(&self, function: &Function) -> Result<()>;

    /// Looks up a function by id.
    async fn find_function(&self, id: &FunctionId) -> Result<Option<Function>>;

    /// Returns every function owned by `tenant`, oldest first.
    async fn find_functions_by_tenant(&self, tenant: &TenantId) -> Result<Vec<Function>>;

    /// Counts the functions owned by `tenant`.
    async fn count_functions_by_tenant(&self, tenant: &TenantId) -> Result<usize> {
        Ok(self.find_functions_by_tenant(tenant).await?.len())
    }

    /// Deletes a function definition. Returns `false` if it did not exist.
    async fn delete_function(&self, id: &FunctionId) -> Result<bool>;

    /// Appends an execution record.
    async fn save_execution(&self, record: &ExecutionRecord) -> Result<()>;

    /// Returns every execution record of a function, in no particular order.
    async fn find_executions_by_function(&self, id: &FunctionId) -> Result<Vec<ExecutionRecord>>;

    /// Deletes every execution record of a function and returns how many
    /// were removed.
    async fn delete_executions_by_function(&self, id: &FunctionId) -> Result<usize>;
}

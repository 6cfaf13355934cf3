//! In-memory store.

use async_trait::async_trait;
use faas_core::traits::FunctionStore;
use faas_core::{ExecutionRecord, Function, FunctionId, Result, TenantId};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local store. Contents are lost when the value is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    functions: RwLock<HashMap<FunctionId, Function>>,
    executions: RwLock<HashMap<FunctionId, Vec<ExecutionRecord>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FunctionStore for MemoryStore {
    async fn save_function(&self, function: &Function) -> Result<()> {
        self.functions
            .write()
            .await
            .insert(function.id, function.clone());
        Ok(())
    }

    async fn find_function(&self, id: &FunctionId) -> Result<Option<Function>> {
        Ok(self.functions.read().await.get(id).cloned())
    }

    async fn find_functions_by_tenant(&self, tenant: &TenantId) -> Result<Vec<Function>> {
        let mut owned: Vec<Function> = self
            .functions
            .read()
            .await
            .values()
            .filter(|f| f.is_owned_by(tenant))
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(owned)
    }

    async fn count_functions_by_tenant(&self, tenant: &TenantId) -> Result<usize> {
        Ok(self
            .functions
            .read()
            .await
            .values()
            .filter(|f| f.is_owned_by(tenant))
            .count())
    }

    async fn delete_function(&self, id: &FunctionId) -> Result<bool> {
        Ok(self.functions.write().await.remove(id).is_some())
    }

    async fn save_execution(&self, record: &ExecutionRecord) -> Result<()> {
        self.executions
            .write()
            .await
            .entry(record.function_id)
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn find_executions_by_function(&self, id: &FunctionId) -> Result<Vec<ExecutionRecord>> {
        Ok(self
            .executions
            .read()
            .await
            .get(id)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_executions_by_function(&self, id: &FunctionId) -> Result<usize> {
        Ok(self
            .executions
            .write()
            .await
            .remove(id)
            .map_or(0, |records| records.len()))
    }
}

//! The execution engine.
//!
//! Every invocation walks the same path:
//!
//! ```text
//! requested -> rate limit checked -> function resolved -> executing
//!           -> succeeded | failed | timed out | infrastructure error
//! ```
//!
//! A rejection before `executing` returns an error and leaves no record.
//! Every terminal state produces exactly one persisted [`ExecutionRecord`];
//! runtime failures are data in that record, not errors. The one exception
//! is a function deleted while it runs: its record is discarded and the
//! caller gets [`Error::NotFound`], so no record outlives its function.

use crate::cache::FunctionCache;
use crate::metrics::Metrics;
use crate::rate_limit::{RateDecision, RateLimiter};
use chrono::Utc;
use faas_core::stats::ExecutionStats;
use faas_core::traits::{CodeExecutor, FunctionStore};
use faas_core::{
    EngineConfig, Error, ExecutionRecord, ExecutionRequest, Function, FunctionId, NewFunction,
    Result, TenantId,
};
use faas_sandbox::SandboxExecutor;
use faas_validator::CodeValidator;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Longest accepted function name, in characters.
pub const MAX_NAME_CHARS: usize = 128;

/// Multi-tenant function engine.
///
/// Owns the limiter, cache and counters; persistence and process execution
/// are delegated to the injected [`FunctionStore`] and [`CodeExecutor`].
///
/// # Examples
///
/// ```no_run
/// use faas_core::{Language, NewFunction, TenantId};
/// use faas_engine::ExecutionEngine;
/// use faas_store::MemoryStore;
/// use std::sync::Arc;
///
/// # async fn example() -> faas_core::Result<()> {
/// let engine = ExecutionEngine::builder(Arc::new(MemoryStore::new())).build()?;
/// let tenant = TenantId::new("acme");
///
/// let function = engine
///     .create_function(
///         &tenant,
///         NewFunction::new("greet", Language::Python, "print(event.get('name'))"),
///     )
///     .await?;
/// let record = engine.invoke(&tenant, &function.id, r#"{"name": "Ada"}"#).await?;
/// assert_eq!(record.output, "Ada\n");
/// # Ok(())
/// # }
/// ```
pub struct ExecutionEngine {
    store: Arc<dyn FunctionStore>,
    executor: Arc<dyn CodeExecutor>,
    validator: CodeValidator,
    limiter: RateLimiter,
    cache: FunctionCache,
    metrics: Metrics,
    config: EngineConfig,
    // Serializes the count-then-save in create_function.
    creation: Mutex<()>,
    // Deletion holds it exclusively; saving an execution record holds it shared.
    removal: RwLock<()>,
}

impl fmt::Debug for ExecutionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("validator", &self.validator)
            .field("limiter", &self.limiter)
            .field("cache", &self.cache)
            .field("metrics", &self.metrics)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ExecutionEngine`].
pub struct ExecutionEngineBuilder {
    store: Arc<dyn FunctionStore>,
    executor: Option<Arc<dyn CodeExecutor>>,
    validator: Option<CodeValidator>,
    config: EngineConfig,
}

impl fmt::Debug for ExecutionEngineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionEngineBuilder")
            .field("executor", &self.executor.as_ref().map(|_| "CodeExecutor{..}"))
            .field("validator", &self.validator)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ExecutionEngineBuilder {
    /// Uses `executor` instead of a [`SandboxExecutor`] built from the
    /// sandbox configuration.
    #[must_use]
    pub fn executor(mut self, executor: Arc<dyn CodeExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Uses `validator` instead of one built from the validator configuration.
    #[must_use]
    pub fn validator(mut self, validator: CodeValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Sets the engine configuration.
    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the engine.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the configuration is invalid.
    pub fn build(self) -> Result<ExecutionEngine> {
        self.config.validate()?;
        let config = self.config;

        let executor = self
            .executor
            .unwrap_or_else(|| Arc::new(SandboxExecutor::new(config.sandbox.clone())));
        let validator = self
            .validator
            .unwrap_or_else(|| CodeValidator::new(config.validator));

        debug!(
            max_functions = config.max_functions_per_tenant,
            per_minute = config.rate_limit.per_minute,
            per_hour = config.rate_limit.per_hour,
            "engine configured"
        );

        Ok(ExecutionEngine {
            store: self.store,
            executor,
            validator,
            limiter: RateLimiter::new(config.rate_limit),
            cache: FunctionCache::new(config.cache),
            metrics: Metrics::new(),
            config,
            creation: Mutex::new(()),
            removal: RwLock::new(()),
        })
    }
}

impl ExecutionEngine {
    /// Starts building an engine on top of `store`.
    #[must_use]
    pub fn builder(store: Arc<dyn FunctionStore>) -> ExecutionEngineBuilder {
        ExecutionEngineBuilder {
            store,
            executor: None,
            validator: None,
            config: EngineConfig::default(),
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Source validator used for new functions.
    #[must_use]
    pub const fn validator(&self) -> &CodeValidator {
        &self.validator
    }

    /// Validates, stores and caches a new function for `tenant`.
    ///
    /// Checks run in order: name, resource limits, the tenant's function
    /// ceiling, then the source. Nothing is persisted unless all pass.
    ///
    /// # Errors
    ///
    /// - [`Error::ValidationError`] for a bad name, limits outside the caps,
    ///   or blank, oversized or malformed source
    /// - [`Error::QuotaExceeded`] if the tenant is at its ceiling
    /// - [`Error::SecurityViolation`] if the source uses a forbidden
    ///   capability
    /// - [`Error::StorageError`] if the store fails
    pub async fn create_function(&self, tenant: &TenantId, request: NewFunction) -> Result<Function> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(Error::ValidationError {
                field: "name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(Error::ValidationError {
                field: "name".to_string(),
                reason: format!("must be at most {MAX_NAME_CHARS} characters"),
            });
        }

        let policy = self
            .config
            .resources
            .defaults
            .with_overrides(&request.overrides, &self.config.resources.caps)?;

        let _guard = self.creation.lock().await;

        let owned = self.store.count_functions_by_tenant(tenant).await?;
        let limit = self.config.max_functions_per_tenant;
        if owned >= limit {
            warn!(%tenant, owned, limit, "function quota exceeded");
            return Err(Error::QuotaExceeded {
                tenant: tenant.clone(),
                limit,
            });
        }

        let source = self.validator.validate(&request.source, request.language)?;

        let function = Function {
            id: FunctionId::new(),
            tenant: tenant.clone(),
            name: name.to_string(),
            language: request.language,
            source,
            created_at: Utc::now(),
            policy,
        };
        self.store.save_function(&function).await?;
        self.cache.put(function.clone());

        info!(
            %tenant,
            function = %function.id,
            name = %function.name,
            language = %function.language,
            %policy,
            "function created"
        );
        Ok(function)
    }

    /// Deletes a function and its execution history.
    ///
    /// Invocations already running are not interrupted; their records are
    /// discarded when they finish.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the function does not exist or belongs
    /// to another tenant, or [`Error::StorageError`] if the store fails.
    pub async fn delete_function(&self, tenant: &TenantId, id: &FunctionId) -> Result<()> {
        let function = self
            .store
            .find_function(id)
            .await?
            .filter(|f| f.is_owned_by(tenant))
            .ok_or_else(|| not_found(id))?;

        let _removal = self.removal.write().await;
        self.cache.invalidate(id);
        let removed = self.store.delete_executions_by_function(id).await?;
        self.store.delete_function(id).await?;
        // A concurrent invoke may have re-cached it while the store calls ran.
        self.cache.invalidate(id);

        info!(%tenant, function = %function.id, executions = removed, "function deleted");
        Ok(())
    }

    /// Runs a function once with `input` and records the result.
    ///
    /// A function that fails, times out, or cannot be started still
    /// yields `Ok`; inspect [`ExecutionRecord::status`].
    ///
    /// # Errors
    ///
    /// - [`Error::ValidationError`] if `input` exceeds `max_input_bytes`
    /// - [`Error::RateLimited`] if the tenant is over its rate
    /// - [`Error::NotFound`] if the function does not exist, belongs to
    ///   another tenant, or was deleted before the invocation finished
    /// - [`Error::StorageError`] if the store fails
    pub async fn invoke(
        &self,
        tenant: &TenantId,
        id: &FunctionId,
        input: &str,
    ) -> Result<ExecutionRecord> {
        if input.len() > self.config.max_input_bytes {
            return Err(Error::ValidationError {
                field: "input".to_string(),
                reason: format!(
                    "is {} bytes, limit is {} bytes",
                    input.len(),
                    self.config.max_input_bytes
                ),
            });
        }

        if let RateDecision::Limited(usage) = self.limiter.try_acquire(tenant) {
            self.metrics.record_rate_limited();
            warn!(%tenant, function = %id, %usage, "invocation rate limited");
            return Err(Error::RateLimited {
                tenant: tenant.clone(),
                minute_count: usage.minute_count,
                minute_limit: usage.minute_limit,
                hour_count: usage.hour_count,
                hour_limit: usage.hour_limit,
            });
        }

        let function = self.resolve(tenant, id).await?;

        debug!(%tenant, function = %id, policy = %function.policy, "executing function");
        let outcome = self
            .executor
            .execute(ExecutionRequest {
                language: function.language,
                source: &function.source,
                input,
                policy: function.policy,
            })
            .await;

        let record = ExecutionRecord::from_outcome(&function, input, &outcome);
        self.metrics.record_execution(tenant, record.status);

        {
            let _removal = self.removal.read().await;
            if self.store.find_function(id).await?.is_none() {
                warn!(
                    %tenant,
                    function = %id,
                    execution = %record.id,
                    status = %record.status,
                    "function deleted during invocation, record discarded"
                );
                return Err(not_found(id));
            }
            self.store.save_execution(&record).await?;
        }

        info!(
            %tenant,
            function = %id,
            execution = %record.id,
            status = %record.status,
            duration_ms = record.duration_ms,
            "invocation finished"
        );
        Ok(record)
    }

    /// Returns a function owned by `tenant`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the function does not exist or belongs
    /// to another tenant.
    pub async fn get_function(&self, tenant: &TenantId, id: &FunctionId) -> Result<Function> {
        Ok(Function::clone(&*self.resolve(tenant, id).await?))
    }

    /// Returns every function owned by `tenant`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageError`] if the store fails.
    pub async fn list_functions(&self, tenant: &TenantId) -> Result<Vec<Function>> {
        self.store.find_functions_by_tenant(tenant).await
    }

    /// Returns the execution history of a function, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the function does not exist or belongs
    /// to another tenant.
    pub async fn list_executions(
        &self,
        tenant: &TenantId,
        id: &FunctionId,
    ) -> Result<Vec<ExecutionRecord>> {
        self.resolve(tenant, id).await?;
        let mut records = self.store.find_executions_by_function(id).await?;
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(records)
    }

    /// Captures the engine counters.
    #[must_use]
    pub fn stats(&self) -> ExecutionStats {
        ExecutionStats {
            cache_size: self.cache.len(),
            cache_hits: self.cache.hits(),
            cache_misses: self.cache.misses(),
            rate_limited_tenants: self.limiter.tracked_tenants(),
            ..self.metrics.snapshot()
        }
    }

    /// Looks `id` up in the cache, then the store, on behalf of `tenant`.
    async fn resolve(&self, tenant: &TenantId, id: &FunctionId) -> Result<Arc<Function>> {
        if let Some(function) = self.cache.get(id, tenant) {
            return Ok(function);
        }
        match self.store.find_function(id).await? {
            Some(function) if function.is_owned_by(tenant) => Ok(self.cache.put(function)),
            Some(_) => {
                debug!(%tenant, function = %id, "function owned by another tenant");
                Err(not_found(id))
            }
            None => Err(not_found(id)),
        }
    }
}

fn not_found(id: &FunctionId) -> Error {
    Error::NotFound {
        resource: format!("function {id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faas_core::{Language, ResourceOverrides};
    use faas_store::MemoryStore;

    fn engine(config: EngineConfig) -> ExecutionEngine {
        ExecutionEngine::builder(Arc::new(MemoryStore::new()))
            .config(config)
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.cache.capacity = 0;
        let err = ExecutionEngine::builder(Arc::new(MemoryStore::new()))
            .config(config)
            .build()
            .unwrap_err();
        assert!(err.is_config_error());
    }

    #[tokio::test]
    async fn test_name_checks() {
        let engine = engine(EngineConfig::default());
        let tenant = TenantId::new("acme");

        let err = engine
            .create_function(&tenant, NewFunction::new("   ", Language::Python, "print(1)"))
            .await
            .unwrap_err();
        assert!(err.is_validation_error());

        let long = "x".repeat(MAX_NAME_CHARS + 1);
        let err = engine
            .create_function(&tenant, NewFunction::new(long, Language::Python, "print(1)"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("at most 128"));

        let created = engine
            .create_function(&tenant, NewFunction::new("  padded  ", Language::Python, "print(1)"))
            .await
            .unwrap();
        assert_eq!(created.name, "padded");
    }

    #[tokio::test]
    async fn test_overrides_outside_caps_rejected() {
        let engine = engine(EngineConfig::default());
        let request = NewFunction::new("slow", Language::Python, "print(1)").with_overrides(
            ResourceOverrides {
                timeout_secs: Some(10_000),
                ..ResourceOverrides::default()
            },
        );

        let err = engine
            .create_function(&TenantId::new("acme"), request)
            .await
            .unwrap_err();
        assert!(err.is_validation_error());
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[tokio::test]
    async fn test_created_function_is_cached() {
        let engine = engine(EngineConfig::default());
        let tenant = TenantId::new("acme");
        let function = engine
            .create_function(&tenant, NewFunction::new("f", Language::Python, "print(1)"))
            .await
            .unwrap();

        assert_eq!(engine.stats().cache_size, 1);
        engine.get_function(&tenant, &function.id).await.unwrap();
        assert_eq!(engine.stats().cache_hits, 1);
    }

    #[tokio::test]
    async fn test_oversized_input_rejected_before_rate_limit() {
        let config = EngineConfig::builder().max_input_bytes(8).build();
        let engine = engine(config);
        let tenant = TenantId::new("acme");

        let err = engine
            .invoke(&tenant, &FunctionId::new(), "0123456789")
            .await
            .unwrap_err();
        assert!(err.is_validation_error());
        assert_eq!(engine.stats().rate_limited_tenants, 0);
    }

    #[tokio::test]
    async fn test_foreign_function_is_not_found() {
        let engine = engine(EngineConfig::default());
        let owner = TenantId::new("acme");
        let intruder = TenantId::new("globex");
        let function = engine
            .create_function(&owner, NewFunction::new("f", Language::Python, "print(1)"))
            .await
            .unwrap();

        assert!(engine.get_function(&intruder, &function.id).await.unwrap_err().is_not_found());
        assert!(engine.delete_function(&intruder, &function.id).await.unwrap_err().is_not_found());
        assert!(
            engine
                .list_executions(&intruder, &function.id)
                .await
                .unwrap_err()
                .is_not_found()
        );
        assert!(engine.get_function(&owner, &function.id).await.is_ok());
    }
}

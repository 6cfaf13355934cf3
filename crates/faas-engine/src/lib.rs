//! Multi-tenant function execution engine.
//!
//! Ties the validator, the sandbox and a [`FunctionStore`](faas_core::traits::FunctionStore)
//! together behind tenant-scoped operations:
//!
//! - [`ExecutionEngine`] - create, invoke, inspect and delete functions
//! - [`RateLimiter`] - per-tenant minute and hour invocation windows
//! - [`FunctionCache`] - bounded, TTL-limited definition cache
//! - [`Metrics`] - invocation counters behind [`ExecutionEngine::stats`]
//! - [`StaticTenant`] / [`EnvTenantResolver`] - tenant resolution
//!
//! All shared state lives in the engine value; two engines never share a
//! limiter or cache.

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod cache;
pub mod engine;
pub mod identity;
pub mod metrics;
pub mod rate_limit;

pub use cache::FunctionCache;
pub use engine::{ExecutionEngine, ExecutionEngineBuilder, MAX_NAME_CHARS};
pub use identity::{EnvTenantResolver, StaticTenant, TENANT_ENV_VAR};
pub use metrics::Metrics;
pub use rate_limit::{RateDecision, RateLimiter, RateUsage};

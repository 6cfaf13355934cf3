//! Core types, traits, and errors for the function execution engine.
//!
//! This crate provides the foundational types shared by every other crate
//! in the workspace.
//!
//! # Architecture
//!
//! The core consists of:
//! - Strong domain types (`TenantId`, `FunctionId`, `ExecutionId`, `Language`)
//! - Persisted entities (`Function`, `ExecutionRecord`)
//! - Per-function resource policy with platform caps
//! - Error hierarchy with contextual information
//! - Collaborator traits for execution, persistence and tenant resolution
//! - Engine configuration and statistics snapshots

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod config;
mod error;
mod execution;
mod function;
mod limits;
mod types;

pub mod cli;
pub mod stats;
pub mod traits;

pub use config::{
    CacheConfig, EngineConfig, EngineConfigBuilder, RateLimitConfig, ResourceConfig,
    SandboxConfig, ValidatorConfig,
};
pub use error::{Error, Result};
pub use execution::{Enforcement, ExecutionOutcome, ExecutionRequest, ExecutionStatus};
pub use function::{ExecutionRecord, Function, NewFunction};
pub use limits::{ResourceCaps, ResourceOverrides, ResourcePolicy};
pub use types::{DEFAULT_INPUT, ExecutionId, FunctionId, INPUT_ENV_VAR, Language, TenantId};

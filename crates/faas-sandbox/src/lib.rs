//! Process sandbox for function execution.
//!
//! [`SandboxExecutor`] implements [`CodeExecutor`](faas_core::traits::CodeExecutor)
//! by running the configured interpreter as a child process inside a fresh
//! temporary [`Workspace`](workspace::Workspace). Resource policies are applied
//! through a [`ResourceLimiter`](limiter::ResourceLimiter); what was actually
//! enforced is reported in every outcome.
//!
//! # Isolation
//!
//! | Concern | Mechanism |
//! |---------|-----------|
//! | Filesystem | private working directory, removed after the run |
//! | Environment | cleared except an explicit inherit list |
//! | Input | single environment variable, stdin closed |
//! | Time | wall-clock timeout with kill, `RLIMIT_CPU` backstop |
//! | Memory | `RLIMIT_AS` (Python), V8 heap flag (JavaScript) |
//! | CPU | affinity to the first N allowed cores (Linux) |
//!
//! Process, network and filesystem access outside the workspace are not
//! blocked at the OS level; the static validator rejects source that
//! reaches for them.

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod executor;
pub mod limiter;
pub mod workspace;

pub use executor::SandboxExecutor;
pub use limiter::{NoopLimiter, PlatformLimiter, ResourceLimiter, default_limiter};
pub use workspace::Workspace;

//! Collaborator traits.
//!
//! The engine talks to the outside world only through these seams:
//!
//! - `executor` - runs one invocation as an isolated process
//! - `store` - persists function definitions and execution records
//! - `tenant` - resolves the tenant on whose behalf a request runs

mod executor;
mod store;
mod tenant;

pub use executor::CodeExecutor;
pub use store::FunctionStore;
pub use tenant::TenantResolver;

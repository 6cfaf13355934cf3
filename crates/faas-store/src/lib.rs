//! Persistence backends for the function execution engine.
//!
//! Both backends implement [`FunctionStore`](faas_core::traits::FunctionStore):
//!
//! - [`MemoryStore`]: process-local maps, for tests and ephemeral runs
//! - [`FileStore`]: one JSON document per entity under a data directory
//!
//! # Examples
//!
//! ```
//! use faas_core::traits::FunctionStore;
//! use faas_core::TenantId;
//! use faas_store::MemoryStore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> faas_core::Result<()> {
//! let store = MemoryStore::new();
//! let count = store.count_functions_by_tenant(&TenantId::new("acme")).await?;
//! assert_eq!(count, 0);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

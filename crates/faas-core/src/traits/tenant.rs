//! Tenant resolution trait.

use crate::{Result, TenantId};

/// Resolves the tenant on whose behalf the current request runs.
///
/// Authentication happens upstream; implementations only surface an
/// already-established identity.
pub trait TenantResolver: Send + Sync {
    /// Returns the current tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if no tenant identity is available.
    fn current_tenant(&self) -> Result<TenantId>;
}

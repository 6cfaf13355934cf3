//! Tenant resolvers.

use faas_core::traits::TenantResolver;
use faas_core::{Error, Result, TenantId};

/// Environment variable read by [`EnvTenantResolver::default`].
pub const TENANT_ENV_VAR: &str = "FAAS_TENANT";

/// Resolver that always answers the same tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticTenant(TenantId);

impl StaticTenant {
    /// Wraps `tenant`.
    #[must_use]
    pub const fn new(tenant: TenantId) -> Self {
        Self(tenant)
    }
}

impl TenantResolver for StaticTenant {
    fn current_tenant(&self) -> Result<TenantId> {
        Ok(self.0.clone())
    }
}

/// Resolver that reads the tenant from an environment variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvTenantResolver {
    var: String,
}

impl EnvTenantResolver {
    /// Reads the tenant from `var`.
    #[must_use]
    pub fn with_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// Variable name.
    #[must_use]
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvTenantResolver {
    fn default() -> Self {
        Self::with_var(TENANT_ENV_VAR)
    }
}

impl TenantResolver for EnvTenantResolver {
    fn current_tenant(&self) -> Result<TenantId> {
        let value = std::env::var(&self.var).map_err(|e| Error::ConfigError {
            message: format!("no tenant: {} {e}", self.var),
        })?;
        let value = value.trim();
        if value.is_empty() {
            return Err(Error::InvalidArgument(format!("{} is blank", self.var)));
        }
        Ok(TenantId::new(value))
    }
}

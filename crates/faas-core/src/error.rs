//! Error types for the function execution engine.
//!
//! Every fallible operation in the workspace returns [`Error`]. The variants
//! map onto the categories a caller needs to tell apart:
//!
//! - **Validation**: the submitted definition or request is malformed
//!   (`ValidationError`, `SecurityViolation`, `InvalidArgument`)
//! - **Quota**: the tenant is over a ceiling (`QuotaExceeded`, `RateLimited`)
//! - **Resolution**: the function does not exist or is not owned by the
//!   caller (`NotFound`)
//! - **Infrastructure**: storage, configuration, serialization
//!
//! Runtime outcomes of user code (non-zero exit, timeout, spawn failure) are
//! never errors. They are data inside an execution record.
//!
//! # Examples
//!
//! ```
//! use faas_core::{Error, Result};
//!
//! fn check_name(name: &str) -> Result<()> {
//!     if name.trim().is_empty() {
//!         return Err(Error::ValidationError {
//!             field: "name".to_string(),
//!             reason: "must not be blank".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//!
//! let err = check_name("  ").unwrap_err();
//! assert!(err.is_validation_error());
//! ```

use crate::types::TenantId;
use thiserror::Error;

/// Main error type for the function execution engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Validation error for a field of a request or definition.
    ///
    /// Raised for blank or oversized source, structural syntax errors,
    /// invalid names and resource limits outside the platform caps.
    #[error("Validation error in {field}: {reason}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Detailed reason for the validation failure
        reason: String,
    },

    /// Security policy violation.
    ///
    /// Raised when function source matches a deny-list rule.
    #[error("Security policy violation: {reason}")]
    SecurityViolation {
        /// Description of the security violation
        reason: String,
    },

    /// The tenant already owns the maximum number of functions.
    #[error("Function quota exceeded for tenant {tenant}: limit is {limit}")]
    QuotaExceeded {
        /// Tenant that hit the ceiling
        tenant: TenantId,
        /// Configured ceiling
        limit: usize,
    },

    /// The tenant exceeded its invocation rate.
    ///
    /// Carries the usage observed at rejection time.
    #[error(
        "Rate limit exceeded for tenant {tenant}: {minute_count}/{minute_limit} per minute, {hour_count}/{hour_limit} per hour"
    )]
    RateLimited {
        /// Tenant that was throttled
        tenant: TenantId,
        /// Invocations counted in the current minute window
        minute_count: u32,
        /// Per-minute ceiling
        minute_limit: u32,
        /// Invocations counted in the current hour window
        hour_count: u32,
        /// Per-hour ceiling
        hour_limit: u32,
    },

    /// Resource not found.
    ///
    /// Also returned when the resource exists but belongs to another tenant,
    /// so callers cannot probe for foreign identifiers.
    #[error("Resource not found: {resource}")]
    NotFound {
        /// Identifier of the missing resource
        resource: String,
    },

    /// Invalid argument error.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration problem
        message: String,
    },

    /// Persistence layer failure.
    #[error("Storage error: {message}")]
    StorageError {
        /// Description of the storage failure
        message: String,
        /// Underlying cause
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Description of the serialization failure
        message: String,
        /// Underlying serde error
        #[source]
        source: Option<serde_json::Error>,
    },
}

impl Error {
    /// Returns `true` if this is a validation error.
    ///
    /// # Examples
    ///
    /// ```
    /// use faas_core::Error;
    ///
    /// let err = Error::ValidationError {
    ///     field: "source".to_string(),
    ///     reason: "unbalanced braces".to_string(),
    /// };
    /// assert!(err.is_validation_error());
    /// ```
    #[must_use]
    pub const fn is_validation_error(&self) -> bool {
        matches!(self, Self::ValidationError { .. })
    }

    /// Returns `true` if this is a security violation error.
    #[must_use]
    pub const fn is_security_error(&self) -> bool {
        matches!(self, Self::SecurityViolation { .. })
    }

    /// Returns `true` if the request was rejected before any state change
    /// because the definition or arguments are unacceptable.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::ValidationError { .. } | Self::SecurityViolation { .. } | Self::InvalidArgument(_)
        )
    }

    /// Returns `true` if this is a quota error (function ceiling or rate limit).
    ///
    /// # Examples
    ///
    /// ```
    /// use faas_core::{Error, TenantId};
    ///
    /// let err = Error::QuotaExceeded {
    ///     tenant: TenantId::new("acme"),
    ///     limit: 50,
    /// };
    /// assert!(err.is_quota_error());
    /// assert!(!err.is_rate_limited());
    /// ```
    #[must_use]
    pub const fn is_quota_error(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. } | Self::RateLimited { .. })
    }

    /// Returns `true` if this is a rate-limit rejection.
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Returns `true` if this is a resource not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is a configuration error.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigError { .. })
    }

    /// Returns `true` if this is a storage error.
    #[must_use]
    pub const fn is_storage_error(&self) -> bool {
        matches!(self, Self::StorageError { .. })
    }

    /// Builds a [`Error::StorageError`] from any error source.
    pub fn storage(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::StorageError {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

/// Result type alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

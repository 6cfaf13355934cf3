//! Strong domain types for the function execution engine.
//!
//! Identifiers are newtypes so that a tenant id can never be passed where a
//! function id is expected.
//!
//! # Examples
//!
//! ```
//! use faas_core::{FunctionId, Language, TenantId};
//!
//! let tenant = TenantId::new("acme");
//! let id = FunctionId::new();
//! let parsed: FunctionId = id.to_string().parse().unwrap();
//! assert_eq!(id, parsed);
//!
//! let lang: Language = "python".parse().unwrap();
//! assert_eq!(lang.source_file_name(), "function.py");
//! # let _ = tenant;
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Environment variable through which invocation input reaches user code.
pub const INPUT_ENV_VAR: &str = "FUNCTION_INPUT";

/// Input used when an invocation carries no payload.
pub const DEFAULT_INPUT: &str = "{}";

/// Tenant identifier (newtype over String).
///
/// Tenants are authenticated upstream; the engine only uses the id for
/// ownership checks, quotas and rate limiting.
///
/// # Examples
///
/// ```
/// use faas_core::TenantId;
///
/// let id = TenantId::new("acme");
/// assert_eq!(id.as_str(), "acme");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Creates a new tenant identifier.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the tenant ID as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `TenantId` and returns the inner `String`.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TenantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Uuid::parse_str(s.trim()).map(Self).map_err(|e| {
                    Error::InvalidArgument(format!("invalid {} '{s}': {e}", $label))
                })
            }
        }
    };
}

uuid_id!(
    /// Function identifier, unique across all tenants.
    FunctionId,
    "function id"
);

uuid_id!(
    /// Execution record identifier.
    ExecutionId,
    "execution id"
);

/// Scripting dialect a function is written in.
///
/// The dialect decides which deny-list rules apply, how the structural scan
/// treats strings and comments, the workspace file name and the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// JavaScript executed by Node.js.
    JavaScript,
    /// Python 3.
    Python,
}

impl Language {
    /// All supported dialects.
    pub const ALL: [Self; 2] = [Self::JavaScript, Self::Python];

    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::JavaScript => "javascript",
            Self::Python => "python",
        }
    }

    /// File name the source is written to inside an execution workspace.
    #[must_use]
    pub const fn source_file_name(&self) -> &'static str {
        match self {
            Self::JavaScript => "function.js",
            Self::Python => "function.py",
        }
    }

    /// Interpreter command used when no override is configured.
    #[must_use]
    pub const fn default_interpreter(&self) -> &'static str {
        match self {
            Self::JavaScript => "node",
            Self::Python => "python3",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "javascript" | "js" | "node" => Ok(Self::JavaScript),
            "python" | "py" | "python3" => Ok(Self::Python),
            other => Err(Error::ValidationError {
                field: "language".to_string(),
                reason: format!("unsupported language '{other}' (expected: javascript or python)"),
            }),
        }
    }
}

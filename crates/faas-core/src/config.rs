//! Engine configuration.
//!
//! [`EngineConfig`] gathers every tunable of the engine: tenant quotas, rate
//! limits, cache sizing, resource defaults and caps, validator limits and the
//! sandbox process settings. It deserializes from TOML with every field
//! optional, so a config file only needs the values it changes.
//!
//! # Examples
//!
//! ```
//! use faas_core::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str(r#"
//!     max_functions_per_tenant = 10
//!
//!     [rate_limit]
//!     per_minute = 5
//! "#).unwrap();
//!
//! assert_eq!(config.max_functions_per_tenant, 10);
//! assert_eq!(config.rate_limit.per_minute, 5);
//! assert_eq!(config.rate_limit.per_hour, 1000);
//! ```

use crate::{Error, Language, ResourceCaps, ResourcePolicy, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of functions one tenant may own.
    ///
    /// Default: 50
    pub max_functions_per_tenant: usize,

    /// Maximum invocation input size in bytes.
    ///
    /// Default: 64 KiB
    pub max_input_bytes: usize,

    /// Per-tenant invocation rate limits.
    pub rate_limit: RateLimitConfig,

    /// Function definition cache.
    pub cache: CacheConfig,

    /// Resource defaults and caps.
    pub resources: ResourceConfig,

    /// Source validation limits.
    pub validator: ValidatorConfig,

    /// Process sandbox settings.
    pub sandbox: SandboxConfig,
}

impl EngineConfig {
    /// Default per-tenant function ceiling.
    pub const DEFAULT_MAX_FUNCTIONS_PER_TENANT: usize = 50;

    /// Default maximum input size in bytes.
    pub const DEFAULT_MAX_INPUT_BYTES: usize = 64 * 1024;

    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use faas_core::EngineConfig;
    ///
    /// let config = EngineConfig::builder()
    ///     .max_functions_per_tenant(3)
    ///     .rate_limit(10, 100)
    ///     .build();
    ///
    /// assert_eq!(config.max_functions_per_tenant, 3);
    /// assert_eq!(config.rate_limit.per_hour, 100);
    /// ```
    #[must_use]
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::new()
    }

    /// Parses a configuration from TOML text and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the text is not valid TOML, has
    /// unexpected types, or fails [`validate`](Self::validate).
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::ConfigError {
            message: format!("invalid configuration: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::ConfigError {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the file exists but is invalid.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Default configuration file location: `<config_dir>/faas/config.toml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("faas").join("config.toml"))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if:
    /// - Any ceiling or capacity is zero
    /// - The per-minute limit exceeds the per-hour limit
    /// - The default resource policy lies outside the caps
    /// - An interpreter command is blank
    ///
    /// # Examples
    ///
    /// ```
    /// use faas_core::EngineConfig;
    ///
    /// assert!(EngineConfig::default().validate().is_ok());
    ///
    /// let mut invalid = EngineConfig::default();
    /// invalid.cache.capacity = 0;
    /// assert!(invalid.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        let fail = |message: &str| {
            Err(Error::ConfigError {
                message: message.to_string(),
            })
        };

        if self.max_functions_per_tenant == 0 {
            return fail("max_functions_per_tenant must be greater than zero");
        }
        if self.max_input_bytes == 0 {
            return fail("max_input_bytes must be greater than zero");
        }
        if self.rate_limit.per_minute == 0 || self.rate_limit.per_hour == 0 {
            return fail("rate limits must be greater than zero");
        }
        if self.rate_limit.per_minute > self.rate_limit.per_hour {
            return fail("rate_limit.per_minute cannot exceed rate_limit.per_hour");
        }
        if self.cache.capacity == 0 {
            return fail("cache.capacity must be greater than zero");
        }
        if self.cache.ttl_secs == 0 {
            return fail("cache.ttl_secs must be greater than zero");
        }
        if self.validator.max_source_bytes == 0 {
            return fail("validator.max_source_bytes must be greater than zero");
        }
        if self.sandbox.javascript_interpreter.trim().is_empty()
            || self.sandbox.python_interpreter.trim().is_empty()
        {
            return fail("interpreter commands cannot be empty");
        }
        if let Some(root) = &self.sandbox.workspace_root
            && root.as_os_str().is_empty()
        {
            return fail("sandbox.workspace_root cannot be empty");
        }
        self.resources
            .caps
            .check(&self.resources.defaults)
            .map_err(|e| Error::ConfigError {
                message: format!("default resource policy outside caps: {e}"),
            })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_functions_per_tenant: Self::DEFAULT_MAX_FUNCTIONS_PER_TENANT,
            max_input_bytes: Self::DEFAULT_MAX_INPUT_BYTES,
            rate_limit: RateLimitConfig::default(),
            cache: CacheConfig::default(),
            resources: ResourceConfig::default(),
            validator: ValidatorConfig::default(),
            sandbox: SandboxConfig::default(),
        }
    }
}

/// Per-tenant invocation ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Invocations per minute. Default: 30
    pub per_minute: u32,
    /// Invocations per hour. Default: 1000
    pub per_hour: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_minute: 30,
            per_hour: 1000,
        }
    }
}

/// Function definition cache sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum cached definitions before the cache is cleared. Default: 1000
    pub capacity: usize,
    /// Entry lifetime in seconds. Default: 300
    pub ttl_secs: u64,
}

impl CacheConfig {
    /// Entry lifetime as a [`Duration`].
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            ttl_secs: 300,
        }
    }
}

/// Resource defaults applied at creation and the hard caps for overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Policy used for fields a creation request does not override.
    pub defaults: ResourcePolicy,
    /// Inclusive bounds for every field.
    pub caps: ResourceCaps,
}

/// Source validation limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Maximum source size in bytes. Default: 64 KiB
    pub max_source_bytes: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_source_bytes: 64 * 1024,
        }
    }
}

/// Process sandbox settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// JavaScript interpreter command. Default: `node`
    pub javascript_interpreter: String,
    /// Python interpreter command. Default: `python3`
    pub python_interpreter: String,
    /// Directory execution workspaces are created in. Default: system temp dir
    pub workspace_root: Option<PathBuf>,
    /// Host environment variables passed through to user code.
    pub inherit_env: Vec<String>,
    /// Apply platform resource limits. Default: true
    pub enforce_limits: bool,
    /// How long to keep draining output after a timeout kill, in milliseconds.
    pub kill_grace_ms: u64,
}

impl SandboxConfig {
    /// Interpreter command for `language`.
    #[must_use]
    pub fn interpreter(&self, language: Language) -> &str {
        match language {
            Language::JavaScript => &self.javascript_interpreter,
            Language::Python => &self.python_interpreter,
        }
    }

    /// Grace period for draining output after a kill.
    #[must_use]
    pub const fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.kill_grace_ms)
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        let mut inherit_env = vec!["PATH".to_string()];
        if cfg!(windows) {
            inherit_env.push("SYSTEMROOT".to_string());
        }
        Self {
            javascript_interpreter: Language::JavaScript.default_interpreter().to_string(),
            python_interpreter: Language::Python.default_interpreter().to_string(),
            workspace_root: None,
            inherit_env,
            enforce_limits: true,
            kill_grace_ms: 500,
        }
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Creates a builder seeded with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-tenant function ceiling.
    #[must_use]
    pub const fn max_functions_per_tenant(mut self, max: usize) -> Self {
        self.config.max_functions_per_tenant = max;
        self
    }

    /// Sets the maximum input size.
    #[must_use]
    pub const fn max_input_bytes(mut self, max: usize) -> Self {
        self.config.max_input_bytes = max;
        self
    }

    /// Sets per-minute and per-hour invocation ceilings.
    #[must_use]
    pub const fn rate_limit(mut self, per_minute: u32, per_hour: u32) -> Self {
        self.config.rate_limit = RateLimitConfig {
            per_minute,
            per_hour,
        };
        self
    }

    /// Sets cache capacity.
    #[must_use]
    pub const fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache.capacity = capacity;
        self
    }

    /// Sets cache entry lifetime.
    #[must_use]
    pub const fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache.ttl_secs = ttl.as_secs();
        self
    }

    /// Sets the default resource policy.
    #[must_use]
    pub const fn default_policy(mut self, policy: ResourcePolicy) -> Self {
        self.config.resources.defaults = policy;
        self
    }

    /// Sets the maximum source size.
    #[must_use]
    pub const fn max_source_bytes(mut self, max: usize) -> Self {
        self.config.validator.max_source_bytes = max;
        self
    }

    /// Replaces the sandbox settings.
    #[must_use]
    pub fn sandbox(mut self, sandbox: SandboxConfig) -> Self {
        self.config.sandbox = sandbox;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> EngineConfig {
        self.config
    }
}

//! Shared command plumbing: configuration, storage location, tenant
//! resolution and error reporting.

use anyhow::{Context as _, Result, bail};
use colored::Colorize;
use faas_core::cli::{ExitCode, OutputFormat};
use faas_core::traits::TenantResolver;
use faas_core::{EngineConfig, Language, TenantId};
use faas_engine::{EnvTenantResolver, ExecutionEngine, StaticTenant};
use faas_store::FileStore;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Everything a command needs besides its own arguments.
#[derive(Debug, Clone)]
pub struct Context {
    /// Engine configuration.
    pub config: EngineConfig,
    /// Directory holding the function store.
    pub data_dir: PathBuf,
    /// Tenant the command acts for.
    pub tenant: TenantId,
    /// Output format.
    pub format: OutputFormat,
}

impl Context {
    /// Opens the file store under `data_dir` and builds an engine on it.
    pub async fn engine(&self) -> Result<ExecutionEngine> {
        let store = FileStore::open(&self.data_dir)
            .await
            .with_context(|| format!("failed to open store at {}", self.data_dir.display()))?;
        ExecutionEngine::builder(Arc::new(store))
            .config(self.config.clone())
            .build()
            .context("invalid engine configuration")
    }

    /// Prints `value` in the requested format, using `pretty` for pretty mode.
    pub fn print<T: Serialize>(&self, value: &T, pretty: impl FnOnce(&T) -> String) -> Result<()> {
        let rendered = match self.format {
            OutputFormat::Pretty => pretty(value),
            format => crate::formatters::format_output(value, format)
                .context("failed to format output")?,
        };
        println!("{rendered}");
        Ok(())
    }
}

/// Loads the configuration from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => match EngineConfig::default_path() {
            Some(path) => EngineConfig::load_or_default(&path)
                .with_context(|| format!("failed to load configuration from {}", path.display())),
            None => {
                debug!("No configuration directory, using defaults");
                Ok(EngineConfig::default())
            }
        },
    }
}

/// `<data_dir>/faas`, or `.faas` when the platform has no data directory.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(|| PathBuf::from(".faas"), |dir| dir.join("faas"))
}

/// Resolves the tenant from the flag, falling back to the environment.
pub fn resolve_tenant(flag: Option<&str>) -> Result<TenantId> {
    let resolver: Box<dyn TenantResolver> = match flag {
        Some(tenant) if !tenant.trim().is_empty() => {
            Box::new(StaticTenant::new(TenantId::new(tenant.trim())))
        }
        Some(_) => bail!("--tenant must not be blank"),
        None => Box::new(EnvTenantResolver::default()),
    };
    resolver
        .current_tenant()
        .context("no tenant: pass --tenant or set FAAS_TENANT")
}

/// Reads function source from `path`, or stdin for `-`.
pub fn read_source(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        return std::io::read_to_string(std::io::stdin()).context("failed to read source from stdin");
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Uses `explicit` if given, otherwise infers the language from the extension.
pub fn detect_language(path: &Path, explicit: Option<Language>) -> Result<Language> {
    if let Some(language) = explicit {
        return Ok(language);
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("js" | "mjs" | "cjs") => Ok(Language::JavaScript),
        Some("py") => Ok(Language::Python),
        _ => bail!(
            "cannot infer language of {}; pass --language javascript|python",
            path.display()
        ),
    }
}

/// Invocation input from `--input` or `--input-file`, defaulting to `{}`.
pub fn read_input(inline: Option<String>, file: Option<&Path>) -> Result<String> {
    match (inline, file) {
        (Some(input), _) => Ok(input),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input from {}", path.display())),
        (None, None) => Ok(faas_core::DEFAULT_INPUT.to_string()),
    }
}

/// Prints an engine error and maps it to an exit code.
pub fn report(error: &faas_core::Error) -> ExitCode {
    eprintln!("{} {error}", "error:".red().bold());
    ExitCode::for_error(error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_language() {
        assert_eq!(
            detect_language(Path::new("a/handler.py"), None).unwrap(),
            Language::Python
        );
        assert_eq!(
            detect_language(Path::new("index.mjs"), None).unwrap(),
            Language::JavaScript
        );
        assert_eq!(
            detect_language(Path::new("script"), Some(Language::Python)).unwrap(),
            Language::Python
        );
        assert!(detect_language(Path::new("main.rb"), None).is_err());
    }

    #[test]
    fn test_resolve_tenant_from_flag() {
        assert_eq!(resolve_tenant(Some(" acme ")).unwrap(), TenantId::new("acme"));
        assert!(resolve_tenant(Some("  ")).is_err());
    }

    #[test]
    fn test_read_input_defaults() {
        assert_eq!(read_input(None, None).unwrap(), "{}");
        assert_eq!(read_input(Some("[1]".to_string()), None).unwrap(), "[1]");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.json");
        std::fs::write(&path, r#"{"a":1}"#).unwrap();
        assert_eq!(read_input(None, Some(&path)).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn test_load_explicit_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_functions_per_tenant = 3\n").unwrap();
        assert_eq!(load_config(Some(&path)).unwrap().max_functions_per_tenant, 3);
        assert!(load_config(Some(&dir.path().join("missing.toml"))).is_err());
    }
}

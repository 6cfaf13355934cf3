//! `faas` command-line interface.
//!
//! Creates, validates, invokes and inspects sandboxed JavaScript and Python
//! functions stored under a local data directory.
//!
//! # Examples
//!
//! ```bash
//! # Store a function
//! faas --tenant acme create greet handler.py
//!
//! # Invoke it
//! faas --tenant acme invoke <function-id> --input '{"name": "Ada"}'
//!
//! # Try a file without storing it
//! faas run handler.js --input '{"x": 1}' --repeat 3
//! ```

#![allow(clippy::missing_errors_doc)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use faas_cli::commands::{self, common, create::CreateArgs, run::RunArgs};
use faas_core::cli::{ExitCode, OutputFormat};
use faas_core::{FunctionId, Language, ResourceOverrides};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// On-demand sandboxed function execution.
#[derive(Parser, Debug)]
#[command(name = "faas")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: <config_dir>/faas/config.toml)
    #[arg(long, global = true, env = "FAAS_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding stored functions and execution records
    #[arg(long, global = true, env = "FAAS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Tenant to act for (default: $FAAS_TENANT)
    #[arg(long, global = true)]
    tenant: Option<String>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (json, text, pretty)
    #[arg(long = "format", global = true, default_value = "pretty")]
    format: String,
}

/// Resource limit flags shared by `create` and `run`.
#[derive(clap::Args, Debug, Clone, Copy, Default)]
struct LimitArgs {
    /// CPU cores
    #[arg(long)]
    cpu: Option<u32>,

    /// Memory limit in MB
    #[arg(long)]
    memory: Option<u32>,

    /// Timeout in seconds
    #[arg(long)]
    timeout: Option<u32>,
}

impl From<LimitArgs> for ResourceOverrides {
    fn from(args: LimitArgs) -> Self {
        Self {
            cpu_limit: args.cpu,
            memory_limit_mb: args.memory,
            timeout_secs: args.timeout,
        }
    }
}

/// Invocation input flags.
#[derive(clap::Args, Debug, Clone, Default)]
struct InputArgs {
    /// JSON input passed to the function
    #[arg(short, long, conflicts_with = "input_file")]
    input: Option<String>,

    /// Read the input from a file
    #[arg(long)]
    input_file: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate and store a new function.
    Create {
        /// Function name
        name: String,

        /// Source file, or `-` for stdin
        source: PathBuf,

        /// Language (inferred from the extension by default)
        #[arg(short, long)]
        language: Option<Language>,

        #[command(flatten)]
        limits: LimitArgs,
    },

    /// Invoke a stored function.
    Invoke {
        /// Function id
        id: FunctionId,

        #[command(flatten)]
        input: InputArgs,
    },

    /// List stored functions.
    List,

    /// Show the execution history of a function, newest first.
    Logs {
        /// Function id
        id: FunctionId,

        /// Show at most this many records
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Print output and errors of every record
        #[arg(long)]
        full: bool,
    },

    /// Delete a function and its execution history.
    Delete {
        /// Function id
        id: FunctionId,
    },

    /// Check a source file without storing it.
    Validate {
        /// Source file, or `-` for stdin
        source: PathBuf,

        /// Language (inferred from the extension by default)
        #[arg(short, long)]
        language: Option<Language>,
    },

    /// Create and invoke a function in a throwaway in-memory engine.
    Run {
        /// Source file, or `-` for stdin
        source: PathBuf,

        /// Language (inferred from the extension by default)
        #[arg(short, long)]
        language: Option<Language>,

        #[command(flatten)]
        input: InputArgs,

        /// Number of invocations
        #[arg(long, default_value_t = 1)]
        repeat: u32,

        #[command(flatten)]
        limits: LimitArgs,
    },

    /// Check interpreters and show configuration locations.
    Setup,

    /// Generate shell completions.
    Completions {
        /// Target shell for completion generation
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Commands {
    /// Returns `false` for commands that do not act for a tenant.
    const fn needs_tenant(&self) -> bool {
        !matches!(
            self,
            Self::Validate { .. } | Self::Setup | Self::Completions { .. }
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let output_format = cli
        .format
        .parse::<OutputFormat>()
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let exit_code = execute_command(cli, output_format).await?;

    std::process::exit(exit_code.as_i32());
}

/// Installs the stderr tracing subscriber; `--verbose` forces debug level,
/// otherwise `RUST_LOG` applies with a default of `warn`.
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}

/// Routes the parsed command to its handler.
async fn execute_command(cli: Cli, format: OutputFormat) -> Result<ExitCode> {
    let tenant = if cli.command.needs_tenant() {
        common::resolve_tenant(cli.tenant.as_deref())?
    } else {
        faas_core::TenantId::new(cli.tenant.as_deref().unwrap_or("local"))
    };
    let ctx = common::Context {
        config: common::load_config(cli.config.as_deref())?,
        data_dir: cli.data_dir.unwrap_or_else(common::default_data_dir),
        tenant,
        format,
    };

    match cli.command {
        Commands::Create {
            name,
            source,
            language,
            limits,
        } => {
            let args = CreateArgs {
                name: &name,
                source: &source,
                language,
                overrides: limits.into(),
            };
            commands::create::run(&ctx, args).await
        }
        Commands::Invoke { id, input } => {
            let input = common::read_input(input.input, input.input_file.as_deref())?;
            commands::invoke::run(&ctx, &id, &input).await
        }
        Commands::List => commands::list::run(&ctx).await,
        Commands::Logs { id, limit, full } => commands::logs::run(&ctx, &id, limit, full).await,
        Commands::Delete { id } => commands::delete::run(&ctx, &id).await,
        Commands::Validate { source, language } => {
            commands::validate::run(&ctx, &source, language)
        }
        Commands::Run {
            source,
            language,
            input,
            repeat,
            limits,
        } => {
            let input = common::read_input(input.input, input.input_file.as_deref())?;
            let args = RunArgs {
                source: &source,
                language,
                input: &input,
                repeat,
                overrides: limits.into(),
            };
            commands::run::run(&ctx, args).await
        }
        Commands::Setup => commands::setup::run(&ctx).await,
        Commands::Completions { shell } => {
            use clap::CommandFactory;
            commands::completions::run(shell, &mut Cli::command())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_create() {
        let cli = Cli::parse_from([
            "faas", "create", "greet", "handler.py", "--timeout", "5", "--memory", "256",
        ]);
        if let Commands::Create {
            name,
            source,
            language,
            limits,
        } = cli.command
        {
            assert_eq!(name, "greet");
            assert_eq!(source, PathBuf::from("handler.py"));
            assert_eq!(language, None);
            let overrides = ResourceOverrides::from(limits);
            assert_eq!(overrides.timeout_secs, Some(5));
            assert_eq!(overrides.memory_limit_mb, Some(256));
            assert_eq!(overrides.cpu_limit, None);
        } else {
            panic!("Expected Create command");
        }
    }

    #[test]
    fn test_cli_parsing_language() {
        let cli = Cli::parse_from(["faas", "validate", "script", "--language", "js"]);
        if let Commands::Validate { language, .. } = cli.command {
            assert_eq!(language, Some(Language::JavaScript));
        } else {
            panic!("Expected Validate command");
        }
        assert!(Cli::try_parse_from(["faas", "validate", "x", "--language", "ruby"]).is_err());
    }

    #[test]
    fn test_cli_parsing_invoke() {
        let id = FunctionId::new();
        let cli = Cli::parse_from([
            "faas",
            "--tenant",
            "acme",
            "invoke",
            &id.to_string(),
            "--input",
            r#"{"x":1}"#,
        ]);
        assert_eq!(cli.tenant.as_deref(), Some("acme"));
        if let Commands::Invoke { id: parsed, input } = cli.command {
            assert_eq!(parsed, id);
            assert_eq!(input.input.as_deref(), Some(r#"{"x":1}"#));
        } else {
            panic!("Expected Invoke command");
        }
    }

    #[test]
    fn test_cli_rejects_bad_function_id() {
        assert!(Cli::try_parse_from(["faas", "invoke", "not-a-uuid"]).is_err());
    }

    #[test]
    fn test_cli_input_flags_conflict() {
        let id = FunctionId::new().to_string();
        assert!(
            Cli::try_parse_from(["faas", "invoke", &id, "--input", "{}", "--input-file", "x"])
                .is_err()
        );
    }

    #[test]
    fn test_cli_parsing_run() {
        let cli = Cli::parse_from(["faas", "run", "f.js", "--repeat", "3"]);
        if let Commands::Run { repeat, input, .. } = cli.command {
            assert_eq!(repeat, 3);
            assert_eq!(input.input, None);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::parse_from([
            "faas",
            "list",
            "--verbose",
            "--format",
            "json",
            "--data-dir",
            "/tmp/faas",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.format, "json");
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/faas")));
    }

    #[test]
    fn test_needs_tenant() {
        assert!(Commands::List.needs_tenant());
        assert!(!Commands::Setup.needs_tenant());
    }

    #[test]
    fn test_cli_parsing_completions_zsh() {
        let cli = Cli::parse_from(["faas", "completions", "zsh"]);
        if let Commands::Completions { shell } = cli.command {
            assert_eq!(shell, Shell::Zsh);
        } else {
            panic!("Expected Completions command");
        }
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

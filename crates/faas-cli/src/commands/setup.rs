//! Setup command implementation.
//!
//! Checks that the configured interpreters are installed and shows where
//! configuration and data live.

use super::common::Context;
use anyhow::Result;
use colored::Colorize;
use faas_core::cli::ExitCode;
use faas_core::{EngineConfig, Language};
use faas_sandbox::SandboxExecutor;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Runs the setup checks.
///
/// Succeeds if at least one interpreter is usable.
pub async fn run(ctx: &Context) -> Result<ExitCode> {
    println!("Checking runtime environment...\n");

    let executor = SandboxExecutor::new(ctx.config.sandbox.clone());
    let mut available = 0;
    for language in Language::ALL {
        let command = ctx.config.sandbox.interpreter(language);
        match executor.locate_interpreter(language) {
            Ok(path) => match interpreter_version(&path).await {
                Some(version) => {
                    available += 1;
                    println!("{} {language}: {version} ({})", "✓".green(), path.display());
                }
                None => println!(
                    "{} {language}: {} found but not working",
                    "⚠".yellow(),
                    path.display()
                ),
            },
            Err(_) => println!("{} {language}: '{command}' not found in PATH", "✗".red()),
        }
    }

    println!();
    match EngineConfig::default_path() {
        Some(path) if path.exists() => println!("✓ Configuration: {}", path.display()),
        Some(path) => println!("  Configuration: {} (not present, using defaults)", path.display()),
        None => println!("  Configuration: defaults"),
    }
    println!("  Data directory: {}", ctx.data_dir.display());

    if available == 0 {
        println!("\n{} no interpreter available; install Node.js or Python 3", "✗".red());
        return Ok(ExitCode::ERROR);
    }
    println!("\n✓ Runtime setup complete");
    Ok(ExitCode::SUCCESS)
}

async fn interpreter_version(path: &Path) -> Option<String> {
    let output = Command::new(path)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    // Older Pythons print the version on stderr.
    let text = if output.stdout.is_empty() {
        output.stderr
    } else {
        output.stdout
    };
    Some(String::from_utf8_lossy(&text).trim().to_string())
}

//! Validate command implementation.
//!
//! Runs the same checks as `create` without storing anything, and prints
//! the source exactly as it would be stored.

use super::common::{Context, detect_language, read_source, report};
use anyhow::Result;
use colored::Colorize;
use faas_core::Language;
use faas_core::cli::ExitCode;
use faas_validator::CodeValidator;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct Validated {
    valid: bool,
    language: Language,
    source: String,
}

/// Validates a source file.
pub fn run(ctx: &Context, path: &Path, language: Option<Language>) -> Result<ExitCode> {
    let language = detect_language(path, language)?;
    let source = read_source(path)?;
    let validator = CodeValidator::new(ctx.config.validator);

    match validator.validate(&source, language) {
        Ok(sanitized) => {
            let result = Validated {
                valid: true,
                language,
                source: sanitized,
            };
            ctx.print(&result, |r| {
                format!("{} valid {} source\n\n{}", "✓".green(), r.language, r.source.dimmed())
            })?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Ok(report(&e)),
    }
}

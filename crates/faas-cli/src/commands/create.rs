//! Create command implementation.

use super::common::{Context, detect_language, read_source, report};
use crate::formatters::pretty;
use anyhow::Result;
use faas_core::cli::ExitCode;
use faas_core::{Language, NewFunction, ResourceOverrides};
use std::path::Path;
use tracing::info;

/// Arguments of `faas create`.
#[derive(Debug, Clone)]
pub struct CreateArgs<'a> {
    /// Function name.
    pub name: &'a str,
    /// Source file, or `-` for stdin.
    pub source: &'a Path,
    /// Language; inferred from the file extension when absent.
    pub language: Option<Language>,
    /// Resource limit overrides.
    pub overrides: ResourceOverrides,
}

/// Validates and stores a new function for the context's tenant.
///
/// Rejected source, exhausted quotas and limits outside the caps are
/// reported on stderr with a non-zero exit code.
pub async fn run(ctx: &Context, args: CreateArgs<'_>) -> Result<ExitCode> {
    let language = detect_language(args.source, args.language)?;
    let source = read_source(args.source)?;
    info!(name = args.name, %language, "Creating function");

    let engine = ctx.engine().await?;
    let request = NewFunction::new(args.name, language, source).with_overrides(args.overrides);
    match engine.create_function(&ctx.tenant, request).await {
        Ok(function) => {
            ctx.print(&function, pretty::function)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Ok(report(&e)),
    }
}

//! Run command implementation.
//!
//! Creates a function in a throwaway in-memory engine, invokes it one or
//! more times and prints the records followed by the engine statistics.
//! Nothing is written to the data directory.

use super::common::{Context, detect_language, read_source, report};
use crate::formatters::{format_output, pretty};
use anyhow::{Context as _, Result};
use colored::Colorize;
use faas_core::cli::{ExitCode, OutputFormat};
use faas_core::stats::ExecutionStats;
use faas_core::{ExecutionRecord, Language, NewFunction, ResourceOverrides};
use faas_engine::ExecutionEngine;
use faas_store::MemoryStore;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Arguments of `faas run`.
#[derive(Debug, Clone)]
pub struct RunArgs<'a> {
    /// Source file, or `-` for stdin.
    pub source: &'a Path,
    /// Language; inferred from the file extension when absent.
    pub language: Option<Language>,
    /// Invocation input.
    pub input: &'a str,
    /// Number of invocations.
    pub repeat: u32,
    /// Resource limit overrides.
    pub overrides: ResourceOverrides,
}

#[derive(Debug, Serialize)]
struct RunReport {
    executions: Vec<ExecutionRecord>,
    stats: ExecutionStats,
}

/// Runs a source file without storing it.
pub async fn run(ctx: &Context, args: RunArgs<'_>) -> Result<ExitCode> {
    let language = detect_language(args.source, args.language)?;
    let source = read_source(args.source)?;
    let name = args
        .source
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("stdin");

    let engine = ExecutionEngine::builder(Arc::new(MemoryStore::new()))
        .config(ctx.config.clone())
        .build()
        .context("invalid engine configuration")?;

    let request = NewFunction::new(name, language, source).with_overrides(args.overrides);
    let function = match engine.create_function(&ctx.tenant, request).await {
        Ok(function) => function,
        Err(e) => return Ok(report(&e)),
    };

    let mut executions = Vec::new();
    for _ in 0..args.repeat.max(1) {
        match engine.invoke(&ctx.tenant, &function.id, args.input).await {
            Ok(record) => executions.push(record),
            Err(e) => return Ok(report(&e)),
        }
    }

    let exit = executions
        .last()
        .map_or(ExitCode::ERROR, |r| ExitCode::for_status(r.status));
    let summary = RunReport {
        executions,
        stats: engine.stats(),
    };

    if ctx.format == OutputFormat::Pretty {
        for record in &summary.executions {
            println!("{}\n", pretty::record(record));
        }
        println!("{}", "stats:".bold());
        println!("{}", pretty::format(&summary.stats)?);
    } else {
        println!("{}", format_output(&summary, ctx.format)?);
    }
    Ok(exit)
}

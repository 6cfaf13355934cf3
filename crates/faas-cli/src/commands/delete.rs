//! Delete command implementation.

use super::common::{Context, report};
use anyhow::Result;
use colored::Colorize;
use faas_core::FunctionId;
use faas_core::cli::ExitCode;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Deleted {
    id: FunctionId,
    deleted: bool,
}

/// Deletes a function and its execution history.
pub async fn run(ctx: &Context, id: &FunctionId) -> Result<ExitCode> {
    let engine = ctx.engine().await?;
    if let Err(e) = engine.delete_function(&ctx.tenant, id).await {
        return Ok(report(&e));
    }
    ctx.print(&Deleted { id: *id, deleted: true }, |d| {
        format!("{} deleted {}", "✓".green(), d.id)
    })?;
    Ok(ExitCode::SUCCESS)
}
